use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::de;
use super::line_items::{Adjustment, Material, Tile};
use crate::calc::Section;

fn default_true() -> bool {
    true
}

/// Client snapshot embedded in a document.
///
/// Documents carry their own copy of the client block so that editing the
/// client register never rewrites issued paperwork. `client_id` links back
/// to the register entry when the snapshot came from one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDetails {
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub client_address: String,
    #[serde(default)]
    pub client_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    #[serde(default)]
    pub project_name: String,
    #[serde(default = "default_true")]
    pub show_client_name: bool,
    #[serde(default = "default_true")]
    pub show_client_address: bool,
    #[serde(default = "default_true")]
    pub show_client_phone: bool,
    #[serde(default = "default_true")]
    pub show_project_name: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl Default for ClientDetails {
    fn default() -> Self {
        Self {
            client_name: String::new(),
            client_address: String::new(),
            client_phone: String::new(),
            client_email: None,
            project_name: String::new(),
            show_client_name: true,
            show_client_address: true,
            show_client_phone: true,
            show_project_name: true,
            client_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuotationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Invoiced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InvoiceStatus {
    #[default]
    Unpaid,
    Paid,
    Overdue,
}

/// One line of the pre-job checklist on a quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub item: String,
    #[serde(default)]
    pub checked: bool,
}

/// A tiling-project quotation.
///
/// Visibility flags are tri-state: `None` means "inherit the default from
/// settings"; see [`crate::calc::resolve_section`] for the resolution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quotation {
    pub id: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub status: QuotationStatus,
    #[serde(default)]
    pub client_details: ClientDetails,
    #[serde(default)]
    pub tiles: Vec<Tile>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default, deserialize_with = "de::lenient_decimal")]
    pub workmanship_rate: Decimal,
    /// Flat maintenance fee, added on top of workmanship.
    #[serde(default, deserialize_with = "de::lenient_decimal")]
    pub maintenance: Decimal,
    #[serde(default, deserialize_with = "de::lenient_opt_decimal")]
    pub profit_percentage: Option<Decimal>,
    #[serde(default)]
    pub adjustments: Vec<Adjustment>,
    #[serde(default, deserialize_with = "de::lenient_opt_decimal")]
    pub deposit_percentage: Option<Decimal>,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_and_conditions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_materials: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_adjustments: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_tax: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_maintenance: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_workmanship: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_cost_summary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_checklist: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_terms: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_bank_details: Option<bool>,

    /// Technical advice for the job, shown under the line items.
    #[serde(default)]
    pub pro_tips: Vec<String>,
    /// Free-text assessment of site conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_assessment: Option<String>,
}

impl Quotation {
    /// An empty quotation with a fresh id, dated `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date: now,
            status: QuotationStatus::default(),
            client_details: ClientDetails::default(),
            tiles: Vec::new(),
            materials: Vec::new(),
            workmanship_rate: Decimal::ZERO,
            maintenance: Decimal::ZERO,
            profit_percentage: None,
            adjustments: Vec::new(),
            deposit_percentage: None,
            checklist: Vec::new(),
            terms_and_conditions: None,
            invoice_id: None,
            invoice_number: None,
            due_date: None,
            show_materials: None,
            show_adjustments: None,
            show_tax: None,
            show_maintenance: None,
            show_workmanship: None,
            show_cost_summary: None,
            show_checklist: None,
            show_terms: None,
            show_bank_details: None,
            pro_tips: Vec::new(),
            site_assessment: None,
        }
    }
}

/// An invoice raised from a quotation.
///
/// Invoices carry no adjustment list and no deposit percentage; the totals
/// calculator treats both as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub quotation_id: String,
    pub invoice_number: String,
    pub invoice_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default)]
    pub client_details: ClientDetails,
    #[serde(default)]
    pub tiles: Vec<Tile>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default, deserialize_with = "de::lenient_decimal")]
    pub workmanship_rate: Decimal,
    #[serde(default, deserialize_with = "de::lenient_decimal")]
    pub maintenance: Decimal,
    #[serde(default, deserialize_with = "de::lenient_opt_decimal")]
    pub profit_percentage: Option<Decimal>,
    #[serde(default)]
    pub payment_terms: String,
    #[serde(default)]
    pub bank_details: String,
    #[serde(default)]
    pub invoice_notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_materials: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_adjustments: Option<bool>,
}

/// Borrowed view over either document kind.
///
/// The totals calculator and the exporters take this so that quotations and
/// invoices go through exactly the same arithmetic and section gating.
#[derive(Debug, Clone, Copy)]
pub enum DocumentView<'a> {
    Quotation(&'a Quotation),
    Invoice(&'a Invoice),
}

impl<'a> DocumentView<'a> {
    pub fn tiles(&self) -> &'a [Tile] {
        match self {
            Self::Quotation(q) => &q.tiles,
            Self::Invoice(i) => &i.tiles,
        }
    }

    pub fn materials(&self) -> &'a [Material] {
        match self {
            Self::Quotation(q) => &q.materials,
            Self::Invoice(i) => &i.materials,
        }
    }

    /// `None` for invoices, which carry no adjustment list.
    pub fn adjustments(&self) -> Option<&'a [Adjustment]> {
        match self {
            Self::Quotation(q) => Some(&q.adjustments),
            Self::Invoice(_) => None,
        }
    }

    pub fn workmanship_rate(&self) -> Decimal {
        match self {
            Self::Quotation(q) => q.workmanship_rate,
            Self::Invoice(i) => i.workmanship_rate,
        }
    }

    pub fn maintenance(&self) -> Decimal {
        match self {
            Self::Quotation(q) => q.maintenance,
            Self::Invoice(i) => i.maintenance,
        }
    }

    pub fn profit_percentage(&self) -> Option<Decimal> {
        match self {
            Self::Quotation(q) => q.profit_percentage,
            Self::Invoice(i) => i.profit_percentage,
        }
    }

    /// `None` for invoices; only quotations define a deposit.
    pub fn deposit_percentage(&self) -> Option<Decimal> {
        match self {
            Self::Quotation(q) => q.deposit_percentage,
            Self::Invoice(_) => None,
        }
    }

    pub fn client_details(&self) -> &'a ClientDetails {
        match self {
            Self::Quotation(q) => &q.client_details,
            Self::Invoice(i) => &i.client_details,
        }
    }

    /// The document's own setting for a section, if it has one.
    ///
    /// Invoices only carry flags for materials and adjustments; every other
    /// section falls through to the defaults.
    pub fn flag(&self, section: Section) -> Option<bool> {
        match self {
            Self::Quotation(q) => match section {
                Section::Materials => q.show_materials,
                Section::Adjustments => q.show_adjustments,
                Section::Tax => q.show_tax,
                Section::Maintenance => q.show_maintenance,
                Section::Workmanship => q.show_workmanship,
                Section::CostSummary => q.show_cost_summary,
                Section::Checklist => q.show_checklist,
                Section::Terms => q.show_terms,
                Section::BankDetails => q.show_bank_details,
            },
            Self::Invoice(i) => match section {
                Section::Materials => i.show_materials,
                Section::Adjustments => i.show_adjustments,
                _ => None,
            },
        }
    }
}

impl<'a> From<&'a Quotation> for DocumentView<'a> {
    fn from(q: &'a Quotation) -> Self {
        Self::Quotation(q)
    }
}

impl<'a> From<&'a Invoice> for DocumentView<'a> {
    fn from(i: &'a Invoice) -> Self {
        Self::Invoice(i)
    }
}
