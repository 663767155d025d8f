//! One-document PDF rendering via `printpdf` builtin fonts.
//!
//! The layout is a single column: company header, client block, line-item
//! table, then the gated totals. Long documents continue onto extra pages.

use std::io::BufWriter;
use std::path::Path;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use quote_core::calc::{Section, resolve_section};
use quote_core::calculate_totals;
use quote_core::models::{DocumentView, Settings};

use crate::{ExportError, format_money, write_atomic};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const TOP: f32 = 285.0;
const BOTTOM: f32 = 25.0;

const X_DESC: f32 = MARGIN;
const X_QTY: f32 = 110.0;
const X_UNIT: f32 = 145.0;
const X_TOTAL: f32 = 175.0;

struct Cursor {
    doc: printpdf::PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl Cursor {
    fn text(&self, font: &IndirectFontRef, text: &str, size: f32, x: f32) {
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn rule(&self) {
        self.layer.add_line(printpdf::Line {
            points: vec![
                (printpdf::Point::new(Mm(MARGIN), Mm(self.y)), false),
                (
                    printpdf::Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(self.y)),
                    false,
                ),
            ],
            is_closed: false,
        });
    }

    fn advance(&mut self, step: f32) {
        self.y -= step;
        if self.y < BOTTOM {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
        }
    }
}

fn render(doc: DocumentView<'_>, settings: &Settings) -> Result<Vec<u8>, ExportError> {
    let totals = calculate_totals(Some(doc), settings);
    let details = doc.client_details();

    let (title, number, date) = match doc {
        DocumentView::Quotation(q) => (
            settings.company.document_title.clone(),
            q.invoice_number.clone().unwrap_or_default(),
            q.date,
        ),
        DocumentView::Invoice(i) => {
            ("INVOICE".to_string(), i.invoice_number.clone(), i.invoice_date)
        }
    };

    let (pdf, page, layer) =
        PdfDocument::new(title.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = pdf
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    let bold = pdf
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;

    let first_layer = pdf.get_page(page).get_layer(layer);
    let mut cursor = Cursor {
        layer: first_layer,
        doc: pdf,
        y: TOP,
    };

    // Company header, title on the right.
    cursor.text(&bold, &settings.company.name, 16.0, MARGIN);
    cursor.text(&bold, &title, 20.0, 140.0);
    cursor.advance(6.0);
    if !settings.company.slogan.is_empty() {
        cursor.text(&font, &settings.company.slogan, 9.0, MARGIN);
    }
    if !number.is_empty() {
        cursor.text(&bold, &number, 11.0, 140.0);
    }
    cursor.advance(5.0);
    for line in [
        settings.company.address.as_str(),
        settings.company.phone.as_str(),
        settings.company.email.as_str(),
    ] {
        if !line.is_empty() {
            cursor.text(&font, line, 9.0, MARGIN);
            cursor.advance(4.5);
        }
    }
    cursor.text(&font, &format!("Date: {}", date.format("%d %b %Y")), 9.0, 140.0);
    cursor.advance(5.0);
    cursor.rule();
    cursor.advance(8.0);

    // Client block, honoring the per-field show flags.
    cursor.text(&bold, "Prepared for:", 11.0, MARGIN);
    cursor.advance(6.0);
    if details.show_client_name && !details.client_name.is_empty() {
        cursor.text(&font, &details.client_name, 10.0, MARGIN);
        cursor.advance(5.0);
    }
    if details.show_client_address && !details.client_address.is_empty() {
        cursor.text(&font, &details.client_address, 10.0, MARGIN);
        cursor.advance(5.0);
    }
    if details.show_client_phone && !details.client_phone.is_empty() {
        cursor.text(&font, &details.client_phone, 10.0, MARGIN);
        cursor.advance(5.0);
    }
    if details.show_project_name && !details.project_name.is_empty() {
        cursor.text(&font, &format!("Project: {}", details.project_name), 10.0, MARGIN);
        cursor.advance(5.0);
    }
    cursor.advance(4.0);

    // Line items.
    cursor.text(&bold, "Description", 10.0, X_DESC);
    cursor.text(&bold, "Qty", 10.0, X_QTY);
    if settings.display.show_unit_price {
        cursor.text(&bold, "Unit Price", 10.0, X_UNIT);
    }
    cursor.text(&bold, "Amount", 10.0, X_TOTAL);
    cursor.advance(2.5);
    cursor.rule();
    cursor.advance(6.0);

    for tile in doc.tiles() {
        let mut description = tile.category.clone();
        if let Some(group) = &tile.group {
            description = format!("{description} ({group})");
        }
        if settings.display.show_tile_size
            && let Some(size) = &tile.size
        {
            description = format!("{description} ({size})");
        }
        cursor.text(&font, &description, 10.0, X_DESC);
        cursor.text(&font, &format!("{} ctn", tile.cartons), 10.0, X_QTY);
        if settings.display.show_unit_price {
            cursor.text(&font, &format_money(tile.unit_price), 10.0, X_UNIT);
        }
        cursor.text(&font, &format_money(tile.cost()), 10.0, X_TOTAL);
        cursor.advance(5.5);
    }

    if resolve_section(Section::Materials, Some(doc), settings) && !doc.materials().is_empty() {
        cursor.advance(2.0);
        cursor.text(&bold, "Materials", 10.0, X_DESC);
        cursor.advance(5.5);
        for material in doc.materials() {
            cursor.text(&font, &material.item, 10.0, X_DESC);
            cursor.text(
                &font,
                &format!("{} {}", material.quantity, material.unit),
                10.0,
                X_QTY,
            );
            if settings.display.show_unit_price {
                cursor.text(&font, &format_money(material.unit_price), 10.0, X_UNIT);
            }
            cursor.text(&font, &format_money(material.cost()), 10.0, X_TOTAL);
            cursor.advance(5.5);
        }
    }

    if resolve_section(Section::Adjustments, Some(doc), settings)
        && let Some(adjustments) = doc.adjustments()
        && !adjustments.is_empty()
    {
        cursor.advance(2.0);
        cursor.text(&bold, "Adjustments", 10.0, X_DESC);
        cursor.advance(5.5);
        for adjustment in adjustments {
            cursor.text(&font, &adjustment.description, 10.0, X_DESC);
            cursor.text(&font, &format_money(adjustment.amount), 10.0, X_TOTAL);
            cursor.advance(5.5);
        }
    }

    cursor.advance(1.0);
    cursor.rule();
    cursor.advance(7.0);

    // Totals column. The cost summary section can be hidden wholesale,
    // leaving just the grand total.
    let mut total_line = |cursor: &mut Cursor, label: &str, amount, strong: bool| {
        let face = if strong { &bold } else { &font };
        cursor.text(face, label, 10.5, X_QTY);
        cursor.text(face, &format_money(amount), 10.5, X_TOTAL);
        cursor.advance(5.5);
    };

    if resolve_section(Section::CostSummary, Some(doc), settings) {
        total_line(&mut cursor, "Tile Cost", totals.total_tile_cost, false);
        if resolve_section(Section::Materials, Some(doc), settings) {
            total_line(&mut cursor, "Materials", totals.total_material_cost, false);
        }
        total_line(
            &mut cursor,
            "Workmanship & Maintenance",
            totals.workmanship_and_maintenance,
            false,
        );
        if !totals.profit_amount.is_zero() {
            total_line(&mut cursor, "Profit", totals.profit_amount, false);
        }
        if !totals.total_adjustments.is_zero() {
            total_line(&mut cursor, "Adjustments", totals.total_adjustments, false);
        }
        if resolve_section(Section::Tax, Some(doc), settings) {
            total_line(&mut cursor, "Tax", totals.tax_amount, false);
        }
    }
    total_line(&mut cursor, "Grand Total", totals.grand_total, true);
    if settings.display.show_deposit && !totals.deposit_amount.is_zero() {
        total_line(&mut cursor, "Deposit Due", totals.deposit_amount, true);
    }

    // Trailing blocks: bank details, terms, footer.
    if let DocumentView::Invoice(invoice) = doc
        && resolve_section(Section::BankDetails, Some(doc), settings)
        && !invoice.bank_details.is_empty()
    {
        cursor.advance(4.0);
        cursor.text(&bold, "Payment details", 10.0, MARGIN);
        cursor.advance(5.0);
        cursor.text(&font, &invoice.bank_details, 9.5, MARGIN);
        cursor.advance(5.0);
    }
    if let DocumentView::Quotation(quotation) = doc
        && resolve_section(Section::Terms, Some(doc), settings)
    {
        let terms = quotation
            .terms_and_conditions
            .as_deref()
            .unwrap_or(&settings.default_terms);
        if !terms.is_empty() {
            cursor.advance(4.0);
            cursor.text(&bold, "Terms", 10.0, MARGIN);
            cursor.advance(5.0);
            for line in terms.lines() {
                cursor.text(&font, line, 9.5, MARGIN);
                cursor.advance(4.5);
            }
        }
    }
    if !settings.company.footer_text.is_empty() {
        cursor.advance(6.0);
        cursor.text(&font, &settings.company.footer_text, 9.0, MARGIN);
    }

    let mut bytes = Vec::new();
    {
        let mut buffer = BufWriter::new(&mut bytes);
        cursor
            .doc
            .save(&mut buffer)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
    }
    Ok(bytes)
}

/// Exports one document as a single PDF file.
pub fn export_document_pdf(
    doc: DocumentView<'_>,
    settings: &Settings,
    path: &Path,
) -> Result<(), ExportError> {
    let bytes = render(doc, settings)?;
    write_atomic(path, &bytes)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use quote_core::models::{Quotation, Tile, TileType};

    use super::*;

    fn quotation_with_tiles(count: usize) -> Quotation {
        let mut q = Quotation::new(chrono::Utc::now());
        q.client_details.client_name = "Mrs. Adeyemi".to_string();
        q.tiles = (0..count)
            .map(|i| Tile {
                category: format!("Area {i}"),
                group: None,
                cartons: dec!(2),
                sqm: dec!(3),
                tile_type: TileType::Floor,
                unit_price: dec!(4500),
                size: None,
            })
            .collect();
        q
    }

    #[test]
    fn renders_a_wellformed_pdf() {
        let bytes = render(
            (&quotation_with_tiles(3)).into(),
            &Settings::default(),
        )
        .unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn long_documents_spill_onto_extra_pages_without_error() {
        let bytes = render(
            (&quotation_with_tiles(80)).into(),
            &Settings::default(),
        )
        .unwrap();

        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn export_writes_the_file_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");

        export_document_pdf(
            (&quotation_with_tiles(1)).into(),
            &Settings::default(),
            &path,
        )
        .unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("part").exists());
    }
}
