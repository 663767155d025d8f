//! Flat CSV exports: a single document, the quotation history, and the
//! dashboard metrics.

use std::path::Path;

use quote_core::calc::{Section, resolve_section};
use quote_core::metrics::DashboardMetrics;
use quote_core::models::{DocumentView, Quotation, Settings};
use quote_core::calculate_totals;

use crate::{ExportError, format_money, write_atomic};

fn document_rows(doc: DocumentView<'_>, settings: &Settings) -> Result<Vec<u8>, ExportError> {
    let totals = calculate_totals(Some(doc), settings);
    let details = doc.client_details();
    let mut writer = ::csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record([settings.company.name.as_str(), ""])?;
    let title = match doc {
        DocumentView::Quotation(_) => settings.company.document_title.as_str(),
        DocumentView::Invoice(_) => "INVOICE",
    };
    writer.write_record([title, ""])?;
    writer.write_record(["Client", details.client_name.as_str()])?;
    writer.write_record(["Project", details.project_name.as_str()])?;
    writer.write_record(["", ""])?;

    writer.write_record(["Item", "Details", "Qty", "Unit Price", "Amount"])?;
    for tile in doc.tiles() {
        writer.write_record([
            tile.category.as_str(),
            tile.group.as_deref().unwrap_or(""),
            &format!("{} cartons / {} m2", tile.cartons, tile.sqm),
            &format_money(tile.unit_price),
            &format_money(tile.cost()),
        ])?;
    }
    if resolve_section(Section::Materials, Some(doc), settings) {
        for material in doc.materials() {
            writer.write_record([
                material.item.as_str(),
                material.calculation_note.as_deref().unwrap_or(""),
                &format!("{} {}", material.quantity, material.unit),
                &format_money(material.unit_price),
                &format_money(material.cost()),
            ])?;
        }
    }
    if resolve_section(Section::Adjustments, Some(doc), settings)
        && let Some(adjustments) = doc.adjustments()
    {
        for adjustment in adjustments {
            writer.write_record([
                "Adjustment",
                adjustment.description.as_str(),
                "",
                "",
                &format_money(adjustment.amount),
            ])?;
        }
    }
    writer.write_record(["", "", "", "", ""])?;

    let mut total_row = |label: &str, amount| -> Result<(), ExportError> {
        writer.write_record(["", "", "", label, &format_money(amount)])?;
        Ok(())
    };
    total_row("Tile Cost", totals.total_tile_cost)?;
    if resolve_section(Section::Materials, Some(doc), settings) {
        total_row("Material Cost", totals.total_material_cost)?;
    }
    total_row("Workmanship & Maintenance", totals.workmanship_and_maintenance)?;
    if !totals.profit_amount.is_zero() {
        total_row("Profit", totals.profit_amount)?;
    }
    if resolve_section(Section::Adjustments, Some(doc), settings)
        && !totals.total_adjustments.is_zero()
    {
        total_row("Adjustments", totals.total_adjustments)?;
    }
    if resolve_section(Section::Tax, Some(doc), settings) {
        total_row("Tax", totals.tax_amount)?;
    }
    total_row("Grand Total", totals.grand_total)?;
    if !totals.deposit_amount.is_zero() {
        total_row("Deposit Due", totals.deposit_amount)?;
    }

    Ok(writer.into_inner().expect("writing to a Vec cannot fail"))
}

/// Exports one document (quotation or invoice) as CSV.
pub fn export_document_csv(
    doc: DocumentView<'_>,
    settings: &Settings,
    path: &Path,
) -> Result<(), ExportError> {
    let bytes = document_rows(doc, settings)?;
    write_atomic(path, &bytes)
}

/// Exports the quotation history as a one-row-per-document summary.
pub fn export_history_csv(
    quotations: &[Quotation],
    settings: &Settings,
    path: &Path,
) -> Result<(), ExportError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(["Date", "Client", "Project", "Status", "Grand Total"])?;
    for quotation in quotations {
        let totals = calculate_totals(Some(quotation.into()), settings);
        writer.write_record([
            quotation.date.format("%Y-%m-%d").to_string().as_str(),
            quotation.client_details.client_name.as_str(),
            quotation.client_details.project_name.as_str(),
            &format!("{:?}", quotation.status),
            &format_money(totals.grand_total),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .expect("writing to a Vec cannot fail");
    write_atomic(path, &bytes)
}

/// Exports the dashboard metrics, one metric per row, followed by the
/// trailing monthly series.
pub fn export_metrics_csv(metrics: &DashboardMetrics, path: &Path) -> Result<(), ExportError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(["Metric", "Value"])?;
    writer.write_record(["Quotations", &metrics.total_quotations.to_string()])?;
    writer.write_record(["Accepted", &metrics.accepted_quotations.to_string()])?;
    writer.write_record(["Acceptance Rate %", &metrics.acceptance_rate.to_string()])?;
    writer.write_record(["Quoted Value", &format_money(metrics.total_quoted_value)])?;
    writer.write_record(["Invoices Raised", &metrics.invoices_raised.to_string()])?;
    writer.write_record(["Revenue", &format_money(metrics.total_revenue)])?;
    writer.write_record(["Paid This Month", &format_money(metrics.paid_this_month)])?;
    writer.write_record(["Outstanding", &format_money(metrics.outstanding)])?;
    writer.write_record(["Expenses", &format_money(metrics.total_expenses)])?;
    for (category, amount) in &metrics.expenses_by_category {
        writer.write_record([&format!("Expenses: {category}"), &format_money(*amount)])?;
    }
    writer.write_record(["", ""])?;
    writer.write_record(["Month", "Revenue / Expenses"])?;
    for slice in &metrics.monthly {
        writer.write_record([
            slice.month.as_str(),
            &format!(
                "{} / {}",
                format_money(slice.revenue),
                format_money(slice.expenses)
            ),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .expect("writing to a Vec cannot fail");
    write_atomic(path, &bytes)
}
