//! Spreadsheet export as an Excel 2003 SpreadsheetML workbook.
//!
//! Two worksheets: the line items and the cost summary. Excel (and every
//! spreadsheet tool that matters) opens the XML directly.

use std::path::Path;

use tera::Tera;

use quote_core::models::{DocumentView, Settings};

use crate::context::DocumentContext;
use crate::{ExportError, write_atomic};

const TEMPLATE: &str = include_str!("../templates/workbook.xls.tera");
const TEMPLATE_NAME: &str = "workbook.xls";

pub(crate) fn render(doc: DocumentView<'_>, settings: &Settings) -> Result<String, ExportError> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![".xls"]);
    tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;
    let context = tera::Context::from_serialize(DocumentContext::build(doc, settings))?;
    Ok(tera.render(TEMPLATE_NAME, &context)?)
}

/// Exports one document as an Excel-openable `.xls` workbook.
pub fn export_document_excel(
    doc: DocumentView<'_>,
    settings: &Settings,
    path: &Path,
) -> Result<(), ExportError> {
    let xml = render(doc, settings)?;
    write_atomic(path, xml.as_bytes())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use quote_core::calculate_totals;
    use quote_core::models::{Adjustment, Quotation, Tile, TileType};

    use super::*;
    use crate::format_money;

    fn quotation() -> Quotation {
        let mut q = Quotation::new(chrono::Utc::now());
        q.tiles = vec![Tile {
            category: "Step Tiles".to_string(),
            group: None,
            cartons: dec!(5),
            sqm: dec!(6),
            tile_type: TileType::Step,
            unit_price: dec!(7000),
            size: None,
        }];
        q.adjustments = vec![Adjustment {
            description: "Old tile removal".to_string(),
            amount: dec!(15000),
        }];
        q
    }

    #[test]
    fn workbook_carries_the_calculators_grand_total() {
        let q = quotation();
        let settings = Settings::default();

        let xml = render((&q).into(), &settings).unwrap();

        let expected = format_money(calculate_totals(Some((&q).into()), &settings).grand_total);
        assert!(xml.contains(&expected));
        assert!(xml.contains("Cost Summary"));
        assert!(xml.contains("Old tile removal"));
    }

    #[test]
    fn hidden_adjustments_disappear_from_both_sheets() {
        let mut q = quotation();
        q.show_adjustments = Some(false);
        let settings = Settings::default();

        let xml = render((&q).into(), &settings).unwrap();

        assert!(!xml.contains("Old tile removal"));
        // With the adjustment gated off the grand total shrinks accordingly.
        let expected = format_money(calculate_totals(Some((&q).into()), &settings).grand_total);
        assert!(xml.contains(&expected));
    }

    #[test]
    fn export_writes_spreadsheetml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quote.xls");

        export_document_excel((&quotation()).into(), &Settings::default(), &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("mso-application progid=\"Excel.Sheet\""));
    }
}
