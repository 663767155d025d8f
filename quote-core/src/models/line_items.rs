use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::de;

/// Surface classification of a tile line, used for pricing defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileType {
    Wall,
    Floor,
    #[serde(rename = "External Wall")]
    ExternalWall,
    Step,
    #[default]
    Unknown,
}

/// A priced tile line within a document.
///
/// `sqm` is the covered area; `cartons` is what the client is billed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub category: String,
    /// Room or area label, e.g. "Sitting Room".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_decimal")]
    pub cartons: Decimal,
    #[serde(default, deserialize_with = "de::lenient_decimal")]
    pub sqm: Decimal,
    #[serde(default)]
    pub tile_type: TileType,
    #[serde(default, deserialize_with = "de::lenient_decimal")]
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl Tile {
    /// Cost contribution: cartons × unit price.
    pub fn cost(&self) -> Decimal {
        self.cartons * self.unit_price
    }
}

/// A priced material line (cement, grout, adhesive, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub item: String,
    #[serde(default, deserialize_with = "de::lenient_decimal")]
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: String,
    #[serde(default, deserialize_with = "de::lenient_decimal")]
    pub unit_price: Decimal,
    /// How the quantity was derived, e.g. "1 bag per 4m2 area".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_note: Option<String>,
}

impl Material {
    /// Cost contribution: quantity × unit price.
    pub fn cost(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

/// A signed correction applied after profit and before tax.
/// Negative amounts are discounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub description: String,
    #[serde(default, deserialize_with = "de::lenient_decimal")]
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn tile_cost_is_cartons_times_unit_price() {
        let tile = Tile {
            category: "Floor Tiles".to_string(),
            group: None,
            cartons: dec!(10),
            sqm: dec!(15),
            tile_type: TileType::Floor,
            unit_price: dec!(500),
            size: None,
        };

        assert_eq!(tile.cost(), dec!(5000));
    }

    #[test]
    fn material_cost_is_quantity_times_unit_price() {
        let material = Material {
            item: "Cement".to_string(),
            quantity: dec!(12),
            unit: "bags".to_string(),
            unit_price: dec!(5500),
            calculation_note: Some("1 bag per 5m2".to_string()),
        };

        assert_eq!(material.cost(), dec!(66000));
    }

    #[test]
    fn tile_type_round_trips_external_wall_label() {
        let json = serde_json::to_string(&TileType::ExternalWall).unwrap();
        assert_eq!(json, r#""External Wall""#);
        let back: TileType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TileType::ExternalWall);
    }

    #[test]
    fn tile_with_string_numerics_parses_leniently() {
        let tile: Tile = serde_json::from_str(
            r#"{"category": "Wall Tiles", "cartons": "8", "sqm": "12.5", "unit_price": "4,200"}"#,
        )
        .unwrap();

        assert_eq!(tile.cartons, dec!(8));
        assert_eq!(tile.sqm, dec!(12.5));
        assert_eq!(tile.unit_price, dec!(4200));
        assert_eq!(tile.tile_type, TileType::Unknown);
    }
}
