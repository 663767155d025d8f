//! Render context shared by the template-driven exporters (Word, Excel).
//!
//! All gating happens here, once, so the two template formats can never
//! disagree about which sections a document shows.

use serde::Serialize;

use quote_core::calc::{Section, resolve_section};
use quote_core::calculate_totals;
use quote_core::models::{DocumentView, Settings};

use crate::format_money;

#[derive(Debug, Serialize)]
pub(crate) struct LineRow {
    pub description: String,
    pub detail: String,
    pub qty: String,
    pub unit_price: String,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TotalRow {
    pub label: String,
    pub amount: String,
    pub strong: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct DocumentContext {
    pub company_name: String,
    pub company_slogan: String,
    pub company_address: String,
    pub company_phone: String,
    pub company_email: String,
    pub accent_color: String,
    pub footer_text: String,
    pub title: String,
    pub number: String,
    pub date: String,
    pub client_lines: Vec<String>,
    pub tiles: Vec<LineRow>,
    pub materials: Vec<LineRow>,
    pub adjustments: Vec<LineRow>,
    pub show_unit_price: bool,
    pub totals: Vec<TotalRow>,
    pub terms: Vec<String>,
    pub bank_details: String,
    pub notes: String,
    pub pro_tips: Vec<String>,
    pub checklist: Vec<String>,
}

impl DocumentContext {
    pub(crate) fn build(doc: DocumentView<'_>, settings: &Settings) -> Self {
        let totals = calculate_totals(Some(doc), settings);
        let details = doc.client_details();

        let (title, number, date) = match doc {
            DocumentView::Quotation(q) => (
                settings.company.document_title.clone(),
                q.invoice_number.clone().unwrap_or_default(),
                q.date,
            ),
            DocumentView::Invoice(i) => (
                "INVOICE".to_string(),
                i.invoice_number.clone(),
                i.invoice_date,
            ),
        };

        let mut client_lines = Vec::new();
        if details.show_client_name && !details.client_name.is_empty() {
            client_lines.push(details.client_name.clone());
        }
        if details.show_client_address && !details.client_address.is_empty() {
            client_lines.push(details.client_address.clone());
        }
        if details.show_client_phone && !details.client_phone.is_empty() {
            client_lines.push(details.client_phone.clone());
        }
        if details.show_project_name && !details.project_name.is_empty() {
            client_lines.push(format!("Project: {}", details.project_name));
        }

        let tiles = doc
            .tiles()
            .iter()
            .map(|tile| {
                let mut description = tile.category.clone();
                if let Some(group) = &tile.group {
                    description = format!("{description} ({group})");
                }
                let detail = if settings.display.show_tile_size {
                    tile.size.clone().unwrap_or_default()
                } else {
                    String::new()
                };
                LineRow {
                    description,
                    detail,
                    qty: format!("{} ctn / {} m2", tile.cartons, tile.sqm),
                    unit_price: format_money(tile.unit_price),
                    amount: format_money(tile.cost()),
                }
            })
            .collect();

        let materials = if resolve_section(Section::Materials, Some(doc), settings) {
            doc.materials()
                .iter()
                .map(|material| LineRow {
                    description: material.item.clone(),
                    detail: material.calculation_note.clone().unwrap_or_default(),
                    qty: format!("{} {}", material.quantity, material.unit),
                    unit_price: format_money(material.unit_price),
                    amount: format_money(material.cost()),
                })
                .collect()
        } else {
            Vec::new()
        };

        let adjustments = if resolve_section(Section::Adjustments, Some(doc), settings) {
            doc.adjustments()
                .unwrap_or_default()
                .iter()
                .map(|adjustment| LineRow {
                    description: adjustment.description.clone(),
                    detail: String::new(),
                    qty: String::new(),
                    unit_price: String::new(),
                    amount: format_money(adjustment.amount),
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut total_rows = Vec::new();
        let mut push = |label: &str, amount, strong| {
            total_rows.push(TotalRow {
                label: label.to_string(),
                amount: format_money(amount),
                strong,
            });
        };
        if resolve_section(Section::CostSummary, Some(doc), settings) {
            push("Tile Cost", totals.total_tile_cost, false);
            if resolve_section(Section::Materials, Some(doc), settings) {
                push("Material Cost", totals.total_material_cost, false);
            }
            push(
                "Workmanship & Maintenance",
                totals.workmanship_and_maintenance,
                false,
            );
            if !totals.profit_amount.is_zero() {
                push("Profit", totals.profit_amount, false);
            }
            if !totals.total_adjustments.is_zero() {
                push("Adjustments", totals.total_adjustments, false);
            }
            if resolve_section(Section::Tax, Some(doc), settings) {
                push("Tax", totals.tax_amount, false);
            }
        }
        push("Grand Total", totals.grand_total, true);
        if settings.display.show_deposit && !totals.deposit_amount.is_zero() {
            push("Deposit Due", totals.deposit_amount, true);
        }

        let terms = match doc {
            DocumentView::Quotation(q) if resolve_section(Section::Terms, Some(doc), settings) => q
                .terms_and_conditions
                .as_deref()
                .unwrap_or(&settings.default_terms)
                .lines()
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        let (bank_details, notes) = match doc {
            DocumentView::Invoice(i)
                if resolve_section(Section::BankDetails, Some(doc), settings) =>
            {
                (i.bank_details.clone(), i.invoice_notes.clone())
            }
            DocumentView::Invoice(i) => (String::new(), i.invoice_notes.clone()),
            DocumentView::Quotation(_) => (String::new(), String::new()),
        };

        let pro_tips = match doc {
            DocumentView::Quotation(q) => q.pro_tips.clone(),
            DocumentView::Invoice(_) => Vec::new(),
        };

        let checklist = match doc {
            DocumentView::Quotation(q) if resolve_section(Section::Checklist, Some(doc), settings) => q
                .checklist
                .iter()
                .map(|item| {
                    let mark = if item.checked { "[x]" } else { "[ ]" };
                    format!("{mark} {}", item.item)
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            company_name: settings.company.name.clone(),
            company_slogan: settings.company.slogan.clone(),
            company_address: settings.company.address.clone(),
            company_phone: settings.company.phone.clone(),
            company_email: settings.company.email.clone(),
            accent_color: settings.company.accent_color.clone(),
            footer_text: settings.company.footer_text.clone(),
            title,
            number,
            date: date.format("%d %b %Y").to_string(),
            client_lines,
            tiles,
            materials,
            adjustments,
            show_unit_price: settings.display.show_unit_price,
            totals: total_rows,
            terms,
            bank_details,
            notes,
            pro_tips,
            checklist,
        }
    }
}
