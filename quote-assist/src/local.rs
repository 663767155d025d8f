use async_trait::async_trait;
use regex::Regex;
use rust_decimal::Decimal;

use quote_core::models::{
    ChecklistItem, ClientDetails, Material, Quotation, Settings, Tile, TileType,
};

use crate::draft::DraftQuotation;
use crate::Assistant;

/// Deterministic stand-in used when no remote assistant is configured,
/// and as the fallback when the remote one fails.
///
/// Drafts are priced from settings and sized from the first `NN m2` figure
/// found in the notes, so the same notes always produce the same draft.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalAssistant;

/// Area assumed when the notes carry no measurement at all.
const FALLBACK_SQM: i64 = 50;

fn extract_sqm(notes: &str) -> Decimal {
    let pattern = Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*m2").expect("fixed pattern is valid");
    pattern
        .captures(notes)
        .and_then(|captures| captures[1].parse().ok())
        .unwrap_or_else(|| Decimal::from(FALLBACK_SQM))
}

pub(crate) fn build_draft(notes: &str, settings: &Settings) -> DraftQuotation {
    let sqm = extract_sqm(notes);
    let rate = settings
        .pricing
        .tile_rates
        .get("sitting_room")
        .cloned()
        .unwrap_or_default();
    let sqm_per_carton = if rate.sqm_per_carton.is_zero() {
        Decimal::new(15, 1)
    } else {
        rate.sqm_per_carton
    };
    let wastage = if settings.pricing.wastage_factor > Decimal::ZERO {
        settings.pricing.wastage_factor
    } else {
        Decimal::ONE
    };
    let cartons = (sqm * wastage / sqm_per_carton).ceil();
    let cement_bags = (sqm / Decimal::from(5)).ceil();

    DraftQuotation {
        client_details: ClientDetails {
            client_name: "Walk-in Client".to_string(),
            project_name: "Tiling Project".to_string(),
            ..Default::default()
        },
        tiles: vec![Tile {
            category: "Floor Tiles".to_string(),
            group: Some("Sitting Room".to_string()),
            cartons,
            sqm,
            tile_type: TileType::Floor,
            unit_price: rate.price_per_carton,
            size: rate.default_size,
        }],
        materials: vec![
            Material {
                item: "Cement".to_string(),
                quantity: cement_bags,
                unit: "bags".to_string(),
                unit_price: settings.pricing.cement_price,
                calculation_note: Some("1 bag per 5m2".to_string()),
            },
            Material {
                item: "White Cement".to_string(),
                quantity: Decimal::TWO,
                unit: "bags".to_string(),
                unit_price: settings.pricing.white_cement_price,
                calculation_note: Some("approx. 1 bag per 30m2".to_string()),
            },
        ],
        adjustments: Vec::new(),
        checklist: vec![
            ChecklistItem {
                item: "Surface preparation".to_string(),
                checked: false,
            },
            ChecklistItem {
                item: "Tile alignment check".to_string(),
                checked: false,
            },
            ChecklistItem {
                item: "Grouting".to_string(),
                checked: false,
            },
        ],
        workmanship_rate: settings.pricing.workmanship_rate,
        maintenance: Decimal::ZERO,
        profit_percentage: Some(Decimal::TEN),
        deposit_percentage: Some(settings.billing.default_deposit_percentage),
        terms_and_conditions: Some(settings.default_terms.clone()),
        pro_tips: vec![
            "Confirm the screed is level before laying".to_string(),
            "Large-format tiles need back-buttering".to_string(),
        ],
    }
}

#[async_trait]
impl Assistant for LocalAssistant {
    async fn text_from_image(&self, _image: &[u8], _mime: &str) -> String {
        "Sitting Room 60m2\nKitchen 15m2\nCement 10 bags".to_string()
    }

    async fn assess_site(&self, _image: &[u8], _mime: &str) -> String {
        "Site photo review is unavailable offline; inspect for uneven screed, \
         cracks and damp before quoting."
            .to_string()
    }

    async fn draft_quotation(&self, notes: &str, settings: &Settings) -> DraftQuotation {
        build_draft(notes, settings)
    }

    async fn refine_quotation(&self, quotation: &Quotation, _instruction: &str) -> Quotation {
        quotation.clone()
    }
}
