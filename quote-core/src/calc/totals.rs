//! The totals pipeline for quotations and invoices.
//!
//! Every figure shown or exported anywhere in the application comes from
//! [`calculate_totals`]; no other code is allowed to re-derive a cost from
//! line items, which is what keeps the on-screen summary, the history table
//! and all four export formats in agreement.
//!
//! # Stages
//!
//! The calculation is a fixed sequence; each stage feeds the next:
//!
//! | Stage | Value | Definition |
//! |-------|-------|------------|
//! | 1 | `total_sqm` | sum of tile areas (never gated) |
//! | 2 | `total_tile_cost` | sum of cartons x unit price |
//! | 3 | `total_material_cost` | sum of quantity x unit price, zero when materials hidden |
//! | 4 | `workmanship_cost` | sqm x rate, zero when workmanship hidden |
//! | 5 | `workmanship_and_maintenance` | stage 4 + maintenance fee (gated) |
//! | 6 | pre-profit total | stages 2 + 3 + 5 |
//! | 7 | `profit_amount` | stage 6 x profit %, zero when unset |
//! | 8 | `subtotal` | stage 6 + 7 |
//! | 9 | `total_adjustments` | sum of signed adjustments (quotations only, gated) |
//! | 10 | `tax_amount` | (8 + 9) x tax %, zero when tax hidden |
//! | 11 | `grand_total` | 8 + 9 + 10 |
//! | 12 | `deposit_amount` | 11 x deposit %, zero when unset |
//!
//! Section gating follows [`resolve_section`]; the tax percentage always
//! comes from settings, never from the document.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::{percent, round_money};
use super::flags::{Section, resolve_section};
use crate::models::{DocumentView, Settings};

/// The full cost breakdown of a document.
///
/// `Default` is the all-zero breakdown, which is also what a missing
/// document produces.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub total_sqm: Decimal,
    pub total_tile_cost: Decimal,
    pub total_material_cost: Decimal,
    pub workmanship_cost: Decimal,
    pub workmanship_and_maintenance: Decimal,
    pub profit_amount: Decimal,
    pub subtotal: Decimal,
    pub total_adjustments: Decimal,
    pub tax_amount: Decimal,
    pub grand_total: Decimal,
    pub deposit_amount: Decimal,
}

/// Calculates the cost breakdown for a document under the given settings.
///
/// Total over its whole input domain: `None` yields [`Totals::default`],
/// and no combination of line items or flags can make it panic.
pub fn calculate_totals(doc: Option<DocumentView<'_>>, settings: &Settings) -> Totals {
    let Some(doc) = doc else {
        return Totals::default();
    };

    let show_materials = resolve_section(Section::Materials, Some(doc), settings);
    let show_adjustments = resolve_section(Section::Adjustments, Some(doc), settings);
    let show_tax = resolve_section(Section::Tax, Some(doc), settings);
    let show_maintenance = resolve_section(Section::Maintenance, Some(doc), settings);
    let show_workmanship = resolve_section(Section::Workmanship, Some(doc), settings);

    let total_sqm = doc.tiles().iter().map(|t| t.sqm).sum::<Decimal>();
    let total_tile_cost = round_money(doc.tiles().iter().map(|t| t.cost()).sum::<Decimal>());

    let total_material_cost = if show_materials {
        round_money(doc.materials().iter().map(|m| m.cost()).sum::<Decimal>())
    } else {
        Decimal::ZERO
    };

    let workmanship_cost = if show_workmanship {
        round_money(total_sqm * doc.workmanship_rate())
    } else {
        Decimal::ZERO
    };
    let maintenance = if show_maintenance {
        round_money(doc.maintenance())
    } else {
        Decimal::ZERO
    };
    let workmanship_and_maintenance = workmanship_cost + maintenance;

    let pre_profit_total = total_tile_cost + total_material_cost + workmanship_and_maintenance;
    let profit_amount = match doc.profit_percentage() {
        Some(pct) if !pct.is_zero() => round_money(pre_profit_total * percent(pct)),
        _ => Decimal::ZERO,
    };
    let subtotal = pre_profit_total + profit_amount;

    let total_adjustments = match doc.adjustments() {
        Some(adjustments) if show_adjustments => {
            round_money(adjustments.iter().map(|a| a.amount).sum::<Decimal>())
        }
        _ => Decimal::ZERO,
    };

    let post_adjustment_subtotal = subtotal + total_adjustments;
    let tax_amount = if show_tax {
        round_money(post_adjustment_subtotal * percent(settings.billing.tax_percentage))
    } else {
        Decimal::ZERO
    };
    let grand_total = post_adjustment_subtotal + tax_amount;

    let deposit_amount = match doc.deposit_percentage() {
        Some(pct) if !pct.is_zero() => round_money(grand_total * percent(pct)),
        _ => Decimal::ZERO,
    };

    Totals {
        total_sqm,
        total_tile_cost,
        total_material_cost,
        workmanship_cost,
        workmanship_and_maintenance,
        profit_amount,
        subtotal,
        total_adjustments,
        tax_amount,
        grand_total,
        deposit_amount,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{Adjustment, Material, Quotation, Tile, TileType};

    fn tile(cartons: Decimal, sqm: Decimal, unit_price: Decimal) -> Tile {
        Tile {
            category: "Floor Tiles".to_string(),
            group: Some("Sitting Room".to_string()),
            cartons,
            sqm,
            tile_type: TileType::Floor,
            unit_price,
            size: None,
        }
    }

    fn material(quantity: Decimal, unit_price: Decimal) -> Material {
        Material {
            item: "Cement".to_string(),
            quantity,
            unit: "bags".to_string(),
            unit_price,
            calculation_note: None,
        }
    }

    fn bare_quotation() -> Quotation {
        Quotation::new(chrono::Utc::now())
    }

    #[test]
    fn missing_document_yields_all_zero_breakdown() {
        let totals = calculate_totals(None, &Settings::default());

        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn empty_document_yields_all_zero_breakdown() {
        let q = bare_quotation();

        let totals = calculate_totals(Some((&q).into()), &Settings::default());

        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn tile_only_quotation_totals_cartons_times_price() {
        let mut q = bare_quotation();
        q.tiles = vec![tile(dec!(10), dec!(15), dec!(500))];

        let totals = calculate_totals(Some((&q).into()), &Settings::default());

        assert_eq!(totals.total_sqm, dec!(15));
        assert_eq!(totals.total_tile_cost, dec!(5000));
        assert_eq!(totals.grand_total, dec!(5000));
        assert_eq!(totals.deposit_amount, dec!(0));
    }

    #[test]
    fn negative_adjustment_discounts_the_grand_total() {
        let mut q = bare_quotation();
        q.tiles = vec![tile(dec!(10), dec!(15), dec!(500))];
        q.adjustments = vec![Adjustment {
            description: "Goodwill discount".to_string(),
            amount: dec!(-500),
        }];

        let totals = calculate_totals(Some((&q).into()), &Settings::default());

        assert_eq!(totals.total_adjustments, dec!(-500));
        assert_eq!(totals.grand_total, dec!(4500));
    }

    #[test]
    fn hiding_materials_zeroes_their_cost_entirely() {
        let mut q = bare_quotation();
        q.materials = vec![material(dec!(10), dec!(5500))];
        q.show_materials = Some(false);

        let totals = calculate_totals(Some((&q).into()), &Settings::default());

        assert_eq!(totals.total_material_cost, dec!(0));
        assert_eq!(totals.grand_total, dec!(0));
    }

    #[test]
    fn hidden_workmanship_still_reports_sqm() {
        let mut q = bare_quotation();
        q.tiles = vec![tile(dec!(4), dec!(6), dec!(100))];
        q.workmanship_rate = dec!(1500);
        q.show_workmanship = Some(false);

        let totals = calculate_totals(Some((&q).into()), &Settings::default());

        assert_eq!(totals.total_sqm, dec!(6));
        assert_eq!(totals.workmanship_cost, dec!(0));
        assert_eq!(totals.grand_total, dec!(400));
    }

    #[test]
    fn maintenance_fee_is_gated_independently_of_workmanship() {
        let mut q = bare_quotation();
        q.tiles = vec![tile(dec!(1), dec!(2), dec!(100))];
        q.workmanship_rate = dec!(50);
        q.maintenance = dec!(300);
        q.show_maintenance = Some(false);

        let totals = calculate_totals(Some((&q).into()), &Settings::default());

        assert_eq!(totals.workmanship_cost, dec!(100));
        assert_eq!(totals.workmanship_and_maintenance, dec!(100));
    }

    #[test]
    fn profit_applies_after_materials_and_workmanship() {
        let mut q = bare_quotation();
        q.tiles = vec![tile(dec!(10), dec!(15), dec!(500))]; // 5000
        q.materials = vec![material(dec!(2), dec!(1000))]; // 2000
        q.workmanship_rate = dec!(200); // 15 * 200 = 3000
        q.profit_percentage = Some(dec!(10));

        let totals = calculate_totals(Some((&q).into()), &Settings::default());

        assert_eq!(totals.profit_amount, dec!(1000));
        assert_eq!(totals.subtotal, dec!(11000));
        assert_eq!(totals.grand_total, dec!(11000));
    }

    #[test]
    fn tax_applies_after_adjustments() {
        let mut q = bare_quotation();
        q.tiles = vec![tile(dec!(10), dec!(15), dec!(500))]; // 5000
        q.adjustments = vec![Adjustment {
            description: "Extra trip".to_string(),
            amount: dec!(1000),
        }];
        q.show_tax = Some(true);
        let mut settings = Settings::default();
        settings.billing.tax_percentage = dec!(7.5);

        let totals = calculate_totals(Some((&q).into()), &settings);

        assert_eq!(totals.tax_amount, dec!(450.00));
        assert_eq!(totals.grand_total, dec!(6450.00));
    }

    #[test]
    fn deposit_is_a_share_of_the_grand_total() {
        let mut q = bare_quotation();
        q.tiles = vec![tile(dec!(10), dec!(15), dec!(500))];
        q.deposit_percentage = Some(dec!(70));

        let totals = calculate_totals(Some((&q).into()), &Settings::default());

        assert_eq!(totals.deposit_amount, dec!(3500.00));
    }

    #[test]
    fn grand_total_is_the_sum_of_its_published_parts() {
        let mut q = bare_quotation();
        q.tiles = vec![tile(dec!(7), dec!(11.3), dec!(433))];
        q.materials = vec![material(dec!(3), dec!(777))];
        q.workmanship_rate = dec!(155);
        q.maintenance = dec!(120);
        q.profit_percentage = Some(dec!(12.5));
        q.adjustments = vec![Adjustment {
            description: "Rebate".to_string(),
            amount: dec!(-250),
        }];
        q.show_tax = Some(true);
        let mut settings = Settings::default();
        settings.billing.tax_percentage = dec!(7.5);

        let totals = calculate_totals(Some((&q).into()), &settings);

        assert_eq!(
            totals.grand_total,
            totals.total_tile_cost
                + totals.total_material_cost
                + totals.workmanship_and_maintenance
                + totals.profit_amount
                + totals.total_adjustments
                + totals.tax_amount
        );
    }

    #[test]
    fn invoice_never_contributes_adjustments_or_deposit() {
        use crate::numbering::invoice_from_quotation;
        let mut q = bare_quotation();
        q.tiles = vec![tile(dec!(10), dec!(15), dec!(500))];
        q.adjustments = vec![Adjustment {
            description: "Discount".to_string(),
            amount: dec!(-500),
        }];
        q.deposit_percentage = Some(dec!(50));
        let settings = Settings::default();
        let inv = invoice_from_quotation(&q, &settings, "INV-2026-0001".to_string(), q.date);

        let totals = calculate_totals(Some((&inv).into()), &settings);

        assert_eq!(totals.total_adjustments, dec!(0));
        assert_eq!(totals.deposit_amount, dec!(0));
        assert_eq!(totals.grand_total, dec!(5000));
    }
}
