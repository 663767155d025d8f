use crate::models::{DocumentView, Settings};

/// A financial section of a document whose visibility can be toggled.
///
/// A hidden section contributes nothing to the totals and is skipped by
/// every export renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Materials,
    Adjustments,
    Tax,
    Maintenance,
    Workmanship,
    CostSummary,
    Checklist,
    Terms,
    BankDetails,
}

/// Resolves whether a section is visible for a document.
///
/// Resolution order, applied uniformly by the calculator and every export
/// path: the document's own flag when explicitly set, else the settings
/// default, else the hardcoded default. Materials, adjustments, workmanship
/// and the cost summary default to visible; tax and maintenance defer to
/// settings.
pub fn resolve_section(
    section: Section,
    doc: Option<DocumentView<'_>>,
    settings: &Settings,
) -> bool {
    if let Some(explicit) = doc.and_then(|d| d.flag(section)) {
        return explicit;
    }
    match section {
        Section::Tax => settings.display.show_tax,
        Section::Maintenance => settings.display.show_maintenance,
        Section::Materials => settings.display.show_materials_default,
        Section::Adjustments => settings.display.show_adjustments_default,
        Section::Checklist => settings.display.show_checklist_default,
        Section::Terms => settings.display.show_terms,
        Section::Workmanship | Section::CostSummary | Section::BankDetails => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Quotation;

    fn quotation() -> Quotation {
        Quotation::new(chrono::Utc::now())
    }

    #[test]
    fn document_flag_wins_over_settings() {
        let mut q = quotation();
        q.show_tax = Some(true);
        let mut settings = Settings::default();
        settings.display.show_tax = false;

        assert!(resolve_section(Section::Tax, Some((&q).into()), &settings));
    }

    #[test]
    fn unset_flag_falls_back_to_settings() {
        let q = quotation();
        let mut settings = Settings::default();
        settings.display.show_materials_default = false;

        assert!(!resolve_section(Section::Materials, Some((&q).into()), &settings));
    }

    #[test]
    fn workmanship_defaults_to_visible_without_a_settings_knob() {
        let q = quotation();
        let settings = Settings::default();

        assert!(resolve_section(Section::Workmanship, Some((&q).into()), &settings));
        assert!(resolve_section(Section::CostSummary, None, &settings));
    }

    #[test]
    fn invoice_only_overrides_materials_and_adjustments() {
        use crate::models::{Invoice, InvoiceStatus};
        let now = chrono::Utc::now();
        let inv = Invoice {
            id: "i1".to_string(),
            quotation_id: "q1".to_string(),
            invoice_number: "INV-2026-0001".to_string(),
            invoice_date: now,
            due_date: now,
            status: InvoiceStatus::Unpaid,
            client_details: Default::default(),
            tiles: Vec::new(),
            materials: Vec::new(),
            workmanship_rate: Default::default(),
            maintenance: Default::default(),
            profit_percentage: None,
            payment_terms: String::new(),
            bank_details: String::new(),
            invoice_notes: String::new(),
            payment_date: None,
            show_materials: Some(false),
            show_adjustments: None,
        };
        let mut settings = Settings::default();
        settings.display.show_tax = true;

        assert!(!resolve_section(Section::Materials, Some((&inv).into()), &settings));
        // No invoice-level tax flag: settings decide.
        assert!(resolve_section(Section::Tax, Some((&inv).into()), &settings));
    }
}
