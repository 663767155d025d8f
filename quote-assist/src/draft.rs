use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use quote_core::models::{
    Adjustment, ChecklistItem, ClientDetails, Material, Quotation, Tile,
};

/// A structured quotation draft as produced by an assistant.
///
/// This mirrors the document shape minus everything the application owns
/// (id, date, status, sync linkage). Strict parsing is intentional: a
/// remote response that does not fit this shape is treated as a failure
/// and the caller falls back to the local draft.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DraftQuotation {
    #[serde(default)]
    pub client_details: ClientDetails,
    #[serde(default)]
    pub tiles: Vec<Tile>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub adjustments: Vec<Adjustment>,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    #[serde(default)]
    pub workmanship_rate: Decimal,
    #[serde(default)]
    pub maintenance: Decimal,
    #[serde(default)]
    pub profit_percentage: Option<Decimal>,
    #[serde(default)]
    pub deposit_percentage: Option<Decimal>,
    #[serde(default)]
    pub terms_and_conditions: Option<String>,
    #[serde(default)]
    pub pro_tips: Vec<String>,
}

impl DraftQuotation {
    /// Promotes the draft to a full quotation with a fresh id, dated `now`.
    pub fn into_quotation(self, now: DateTime<Utc>) -> Quotation {
        let mut quotation = Quotation::new(now);
        quotation.client_details = self.client_details;
        quotation.tiles = self.tiles;
        quotation.materials = self.materials;
        quotation.adjustments = self.adjustments;
        quotation.checklist = self.checklist;
        quotation.workmanship_rate = self.workmanship_rate;
        quotation.maintenance = self.maintenance;
        quotation.profit_percentage = self.profit_percentage;
        quotation.deposit_percentage = self.deposit_percentage;
        quotation.terms_and_conditions = self.terms_and_conditions;
        quotation.pro_tips = self.pro_tips;
        quotation
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn promotion_keeps_line_items_and_financials() {
        let draft = DraftQuotation {
            workmanship_rate: dec!(1500),
            profit_percentage: Some(dec!(10)),
            pro_tips: vec!["Check the screed is level".to_string()],
            ..Default::default()
        };

        let quotation = draft.clone().into_quotation(Utc::now());

        assert_eq!(quotation.workmanship_rate, dec!(1500));
        assert_eq!(quotation.profit_percentage, Some(dec!(10)));
        assert_eq!(quotation.pro_tips, draft.pro_tips);
        assert!(!quotation.id.is_empty());
    }
}
