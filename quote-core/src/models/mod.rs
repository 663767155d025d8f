mod client;
mod de;
mod document;
mod expense;
mod line_items;
mod settings;

pub use client::Client;
pub use document::{
    ChecklistItem, ClientDetails, DocumentView, Invoice, InvoiceStatus, Quotation, QuotationStatus,
};
pub use expense::Expense;
pub use line_items::{Adjustment, Material, Tile, TileType};
pub use settings::{
    BillingSettings, CompanyProfile, DisplaySettings, PricingSettings, Settings, SizePriceRule,
    TileRate,
};
