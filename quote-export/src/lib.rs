//! Export formatting for quotations and invoices.
//!
//! Every renderer here computes the document's breakdown through
//! [`quote_core::calculate_totals`] exactly once and formats those fields
//! verbatim. No exporter performs its own cost arithmetic; a figure that
//! appears in a file is, by construction, the calculator's figure.
//!
//! Artifacts are written atomically (temp file, then rename), so a failed
//! export never leaves a partial file behind.

mod context;
mod csv;
mod excel;
mod pdf;
mod word;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use thiserror::Error;

use quote_core::models::DocumentView;

pub use self::csv::{export_document_csv, export_history_csv, export_metrics_csv};
pub use excel::export_document_excel;
pub use pdf::export_document_pdf;
pub use word::export_document_word;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV assembly failed: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("template rendering failed: {0}")]
    Template(#[from] tera::Error),

    #[error("PDF assembly failed: {0}")]
    Pdf(String),
}

/// Formats a monetary value with comma thousands separators, two decimals.
pub fn format_money(value: Decimal) -> String {
    let rounded =
        value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac}")
}

/// Suggested file name for a document export, e.g.
/// `quotation-mrs-adeyemi-duplex.pdf`.
pub fn suggested_filename(doc: DocumentView<'_>, extension: &str) -> String {
    let kind = match doc {
        DocumentView::Quotation(_) => "quotation",
        DocumentView::Invoice(_) => "invoice",
    };
    let details = doc.client_details();
    let stem = slug::slugify(format!(
        "{kind} {} {}",
        details.client_name, details.project_name
    ));
    format!("{stem}.{extension}")
}

/// Writes `bytes` to `path` via a sibling temp file and an atomic rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let tmp = path.with_extension("part");
    let mut file = fs::File::create(&tmp).map_err(io_err)?;
    let result = file.write_all(bytes).and_then(|_| file.sync_all());
    drop(file);
    match result {
        Ok(()) => fs::rename(&tmp, path).map_err(io_err),
        Err(source) => {
            let _ = fs::remove_file(&tmp);
            Err(io_err(source))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn money_groups_thousands() {
        assert_eq!(format_money(dec!(0)), "0.00");
        assert_eq!(format_money(dec!(950)), "950.00");
        assert_eq!(format_money(dec!(5000)), "5,000.00");
        assert_eq!(format_money(dec!(1234567.891)), "1,234,567.89");
    }

    #[test]
    fn money_keeps_the_sign_out_of_the_grouping() {
        assert_eq!(format_money(dec!(-4500)), "-4,500.00");
        assert_eq!(format_money(dec!(-0.001)), "0.00");
    }

    #[test]
    fn filenames_slugify_client_and_project() {
        let mut q = quote_core::models::Quotation::new(chrono::Utc::now());
        q.client_details.client_name = "Mrs. Adeyemi".to_string();
        q.client_details.project_name = "Lekki Duplex".to_string();

        let name = suggested_filename((&q).into(), "pdf");

        assert_eq!(name, "quotation-mrs-adeyemi-lekki-duplex.pdf");
    }

    #[test]
    fn atomic_write_leaves_no_partial_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_atomic(&path, b"a,b,c\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b,c\n");
        assert!(!path.with_extension("part").exists());
    }
}
