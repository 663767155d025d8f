use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Carton price, coverage and default size for one tile surface.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TileRate {
    #[serde(default)]
    pub price_per_carton: Decimal,
    /// Square metres covered by one carton.
    #[serde(default)]
    pub sqm_per_carton: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_size: Option<String>,
}

impl TileRate {
    fn new(price: i64, sqm: &str, size: Option<&str>) -> Self {
        Self {
            price_per_carton: Decimal::from(price),
            sqm_per_carton: sqm.parse().unwrap_or_default(),
            default_size: size.map(str::to_string),
        }
    }
}

/// A size-specific price override, e.g. 60x60 cartons priced differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizePriceRule {
    pub size: String,
    pub price: Decimal,
}

/// Pricing defaults used when drafting quotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingSettings {
    /// Per-surface carton rates, keyed by area label
    /// ("wall", "floor", "sitting_room", ...).
    pub tile_rates: BTreeMap<String, TileRate>,
    pub size_prices: Vec<SizePriceRule>,
    pub cement_price: Decimal,
    pub white_cement_price: Decimal,
    pub sharp_sand_price: Decimal,
    /// Labour rate per square metre.
    pub workmanship_rate: Decimal,
    /// Extra coverage bought to absorb cuts and breakage (1.0 = none).
    pub wastage_factor: Decimal,
}

impl Default for PricingSettings {
    fn default() -> Self {
        let mut tile_rates = BTreeMap::new();
        tile_rates.insert("wall".to_string(), TileRate::new(4500, "1.5", None));
        tile_rates.insert("floor".to_string(), TileRate::new(5000, "1.5", None));
        tile_rates.insert(
            "sitting_room".to_string(),
            TileRate::new(6500, "1.44", Some("60x60")),
        );
        tile_rates.insert(
            "bedroom".to_string(),
            TileRate::new(5500, "1.62", Some("40x40")),
        );
        tile_rates.insert("external_wall".to_string(), TileRate::new(4800, "1.5", None));
        tile_rates.insert("step".to_string(), TileRate::new(7000, "1.2", None));
        tile_rates.insert(
            "toilet_wall".to_string(),
            TileRate::new(4200, "1.5", Some("25x40")),
        );
        tile_rates.insert(
            "toilet_floor".to_string(),
            TileRate::new(4500, "1.6", Some("40x40")),
        );
        tile_rates.insert(
            "kitchen_wall".to_string(),
            TileRate::new(4200, "1.5", Some("25x40")),
        );
        tile_rates.insert(
            "kitchen_floor".to_string(),
            TileRate::new(5000, "1.6", Some("40x40")),
        );

        Self {
            tile_rates,
            size_prices: vec![
                SizePriceRule {
                    size: "60x60".to_string(),
                    price: Decimal::from(6500),
                },
                SizePriceRule {
                    size: "40x40".to_string(),
                    price: Decimal::from(5000),
                },
                SizePriceRule {
                    size: "25x40".to_string(),
                    price: Decimal::from(4200),
                },
            ],
            cement_price: Decimal::from(5500),
            white_cement_price: Decimal::from(3500),
            sharp_sand_price: Decimal::from(45000),
            workmanship_rate: Decimal::from(1500),
            wastage_factor: Decimal::new(105, 2),
        }
    }
}

/// Tax, deposit and invoice defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingSettings {
    pub tax_percentage: Decimal,
    pub default_deposit_percentage: Decimal,
    pub invoice_prefix: String,
    pub default_bank_details: String,
    pub default_invoice_notes: String,
    pub default_payment_terms: String,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            tax_percentage: Decimal::ZERO,
            default_deposit_percentage: Decimal::from(70),
            invoice_prefix: "INV".to_string(),
            default_bank_details: String::new(),
            default_invoice_notes: "Thank you for your business.".to_string(),
            default_payment_terms: "Due on Receipt".to_string(),
        }
    }
}

/// Default visibility of document sections.
///
/// Per-document flags override these; see [`crate::calc::resolve_section`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub show_tax: bool,
    pub show_maintenance: bool,
    pub show_materials_default: bool,
    pub show_adjustments_default: bool,
    pub show_checklist_default: bool,
    pub show_terms: bool,
    pub show_deposit: bool,
    pub show_unit_price: bool,
    pub show_subtotal: bool,
    pub show_tile_size: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_tax: false,
            show_maintenance: true,
            show_materials_default: true,
            show_adjustments_default: true,
            show_checklist_default: true,
            show_terms: true,
            show_deposit: true,
            show_unit_price: true,
            show_subtotal: true,
            show_tile_size: false,
        }
    }
}

/// Branding block printed on every exported document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyProfile {
    pub name: String,
    pub slogan: String,
    pub address: String,
    pub email: String,
    pub phone: String,
    pub document_title: String,
    /// Hex color used for headings in rendered documents.
    pub accent_color: String,
    pub footer_text: String,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            name: "Your Company".to_string(),
            slogan: String::new(),
            address: String::new(),
            email: String::new(),
            phone: String::new(),
            document_title: "QUOTATION".to_string(),
            accent_color: "#B8860B".to_string(),
            footer_text: "Thank you for your patronage.".to_string(),
        }
    }
}

/// Process-wide configuration.
///
/// Loaded once at startup, mutated only through the settings-update path,
/// persisted on every change. Calculations and exports receive it by
/// reference; nothing reads it as ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub company: CompanyProfile,
    pub pricing: PricingSettings,
    pub billing: BillingSettings,
    pub display: DisplaySettings,
    pub default_terms: String,
    pub expense_categories: Vec<String>,
    pub material_units: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            company: CompanyProfile::default(),
            pricing: PricingSettings::default(),
            billing: BillingSettings::default(),
            display: DisplaySettings::default(),
            default_terms: "50% deposit before work begins. Quotation valid for 14 days."
                .to_string(),
            expense_categories: vec![
                "Materials".to_string(),
                "Transport".to_string(),
                "Labour".to_string(),
                "Tools".to_string(),
                "Other".to_string(),
            ],
            material_units: vec![
                "bags".to_string(),
                "trips".to_string(),
                "pcs".to_string(),
                "kg".to_string(),
            ],
        }
    }
}
