//! Word-compatible document export.
//!
//! Word opens HTML files carrying the `mso` markers as native documents,
//! which keeps the export dependency-free beyond the template engine.

use std::path::Path;

use tera::Tera;

use quote_core::models::{DocumentView, Settings};

use crate::context::DocumentContext;
use crate::{ExportError, write_atomic};

const TEMPLATE: &str = include_str!("../templates/document.doc.tera");
const TEMPLATE_NAME: &str = "document.doc";

pub(crate) fn render(doc: DocumentView<'_>, settings: &Settings) -> Result<String, ExportError> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![".doc"]);
    tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;
    let context = tera::Context::from_serialize(DocumentContext::build(doc, settings))?;
    Ok(tera.render(TEMPLATE_NAME, &context)?)
}

/// Exports one document as a Word-compatible `.doc` file.
pub fn export_document_word(
    doc: DocumentView<'_>,
    settings: &Settings,
    path: &Path,
) -> Result<(), ExportError> {
    let html = render(doc, settings)?;
    write_atomic(path, html.as_bytes())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use quote_core::calculate_totals;
    use quote_core::models::{Material, Quotation, Tile, TileType};

    use super::*;
    use crate::format_money;

    fn quotation() -> Quotation {
        let mut q = Quotation::new(chrono::Utc::now());
        q.client_details.client_name = "Chief Okafor".to_string();
        q.tiles = vec![Tile {
            category: "Wall Tiles".to_string(),
            group: Some("Kitchen".to_string()),
            cartons: dec!(6),
            sqm: dec!(9),
            tile_type: TileType::Wall,
            unit_price: dec!(4200),
            size: Some("25x40".to_string()),
        }];
        q.materials = vec![Material {
            item: "Grout".to_string(),
            quantity: dec!(4),
            unit: "kg".to_string(),
            unit_price: dec!(1200),
            calculation_note: None,
        }];
        q
    }

    #[test]
    fn rendered_document_shows_the_calculators_grand_total() {
        let q = quotation();
        let settings = Settings::default();

        let html = render((&q).into(), &settings).unwrap();

        let expected = format_money(calculate_totals(Some((&q).into()), &settings).grand_total);
        assert!(html.contains(&expected));
        assert!(html.contains("Chief Okafor"));
        assert!(html.contains("Grand Total"));
    }

    #[test]
    fn hidden_materials_are_omitted_from_the_markup() {
        let mut q = quotation();
        q.show_materials = Some(false);

        let html = render((&q).into(), &Settings::default()).unwrap();

        assert!(!html.contains("Grout"));
        assert!(!html.contains("Material Cost"));
    }

    #[test]
    fn export_produces_a_word_openable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quote.doc");

        export_document_word((&quotation()).into(), &Settings::default(), &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("<html"));
        assert!(contents.contains("schemas-microsoft-com:office:word"));
    }
}
