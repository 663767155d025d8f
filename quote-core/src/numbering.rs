//! Sequential invoice numbers and quotation→invoice conversion.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use crate::models::{Invoice, InvoiceStatus, Quotation, Settings};

/// Default net terms applied to a freshly raised invoice.
const DEFAULT_DUE_DAYS: i64 = 7;

/// Produces the next invoice number in `PREFIX-YEAR-NNNN` form.
///
/// The sequence continues from the highest number already issued for
/// `year` under the configured prefix; numbers from other years or other
/// prefixes are ignored. An empty register yields `...-0001`.
pub fn generate_invoice_number(existing: &[Invoice], settings: &Settings, year: i32) -> String {
    let prefix = match settings.billing.invoice_prefix.trim() {
        "" => "INV",
        p => p,
    };

    let pattern = Regex::new(&format!(r"^{}-{year}-(\d+)", regex::escape(prefix)))
        .expect("escaped prefix always forms a valid pattern");

    let mut next = 1u32;
    for invoice in existing {
        if let Some(captures) = pattern.captures(&invoice.invoice_number)
            && let Ok(sequence) = captures[1].parse::<u32>()
            && sequence >= next
        {
            next = sequence + 1;
        }
    }

    format!("{prefix}-{year}-{next:04}")
}

/// Raises an invoice from an accepted quotation.
///
/// Line items, rates and the materials/adjustments visibility carry over;
/// payment terms, bank details and notes come from settings. The due date
/// defaults to seven days after issue.
pub fn invoice_from_quotation(
    quotation: &Quotation,
    settings: &Settings,
    invoice_number: String,
    now: DateTime<Utc>,
) -> Invoice {
    Invoice {
        id: uuid::Uuid::new_v4().to_string(),
        quotation_id: quotation.id.clone(),
        invoice_number,
        invoice_date: now,
        due_date: now + Duration::days(DEFAULT_DUE_DAYS),
        status: InvoiceStatus::Unpaid,
        client_details: quotation.client_details.clone(),
        tiles: quotation.tiles.clone(),
        materials: quotation.materials.clone(),
        workmanship_rate: quotation.workmanship_rate,
        maintenance: quotation.maintenance,
        profit_percentage: quotation.profit_percentage,
        payment_terms: settings.billing.default_payment_terms.clone(),
        bank_details: settings.billing.default_bank_details.clone(),
        invoice_notes: settings.billing.default_invoice_notes.clone(),
        payment_date: None,
        show_materials: quotation.show_materials,
        show_adjustments: quotation.show_adjustments,
    }
}
