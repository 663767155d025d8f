//! Aggregates for the dashboard view.
//!
//! Revenue figures come from [`calculate_totals`] on each paid invoice, so
//! the dashboard can never disagree with the documents it summarises.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calc::calculate_totals;
use crate::models::{Expense, Invoice, InvoiceStatus, Quotation, QuotationStatus, Settings};

/// One month of the trailing revenue/expense series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySlice {
    /// `YYYY-MM`.
    pub month: String,
    pub revenue: Decimal,
    pub expenses: Decimal,
}

/// Everything the dashboard shows, computed in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_quotations: usize,
    pub accepted_quotations: usize,
    /// Accepted + invoiced, as a percentage of all quotations. Zero when
    /// there are none.
    pub acceptance_rate: Decimal,
    pub total_quoted_value: Decimal,
    pub invoices_raised: usize,
    /// Grand totals of paid invoices.
    pub total_revenue: Decimal,
    /// Revenue from invoices paid in the current calendar month.
    pub paid_this_month: Decimal,
    /// Grand totals of unpaid and overdue invoices.
    pub outstanding: Decimal,
    pub total_expenses: Decimal,
    pub expenses_by_category: BTreeMap<String, Decimal>,
    /// Trailing twelve months, oldest first.
    pub monthly: Vec<MonthlySlice>,
}

fn month_key(date: &DateTime<Utc>) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Steps a `(year, month)` pair back one month.
fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 { (year - 1, 12) } else { (year, month - 1) }
}

impl DashboardMetrics {
    pub fn compute(
        quotations: &[Quotation],
        invoices: &[Invoice],
        expenses: &[Expense],
        settings: &Settings,
        today: DateTime<Utc>,
    ) -> Self {
        let total_quotations = quotations.len();
        let accepted_quotations = quotations
            .iter()
            .filter(|q| {
                matches!(
                    q.status,
                    QuotationStatus::Accepted | QuotationStatus::Invoiced
                )
            })
            .count();
        let acceptance_rate = if total_quotations == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(accepted_quotations as u64) * Decimal::ONE_HUNDRED
                / Decimal::from(total_quotations as u64)
        };

        let total_quoted_value = quotations
            .iter()
            .map(|q| calculate_totals(Some(q.into()), settings).grand_total)
            .sum();

        let current_month = month_key(&today);
        let mut total_revenue = Decimal::ZERO;
        let mut paid_this_month = Decimal::ZERO;
        let mut outstanding = Decimal::ZERO;

        // Seed the trailing twelve months so quiet months still plot as zero.
        let mut monthly: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
        let (mut year, mut month) = (today.year(), today.month());
        for _ in 0..12 {
            monthly.insert(format!("{year:04}-{month:02}"), (Decimal::ZERO, Decimal::ZERO));
            (year, month) = previous_month(year, month);
        }

        for invoice in invoices {
            let grand_total = calculate_totals(Some(invoice.into()), settings).grand_total;
            match invoice.status {
                InvoiceStatus::Paid => {
                    total_revenue += grand_total;
                    let paid_on = invoice.payment_date.unwrap_or(invoice.invoice_date);
                    if month_key(&paid_on) == current_month {
                        paid_this_month += grand_total;
                    }
                    if let Some(slot) = monthly.get_mut(&month_key(&paid_on)) {
                        slot.0 += grand_total;
                    }
                }
                InvoiceStatus::Unpaid | InvoiceStatus::Overdue => outstanding += grand_total,
            }
        }

        let mut total_expenses = Decimal::ZERO;
        let mut expenses_by_category = BTreeMap::new();
        for expense in expenses {
            total_expenses += expense.amount;
            *expenses_by_category
                .entry(expense.category.clone())
                .or_insert(Decimal::ZERO) += expense.amount;
            if let Some(slot) = monthly.get_mut(&month_key(&expense.date)) {
                slot.1 += expense.amount;
            }
        }

        let monthly = monthly
            .into_iter()
            .map(|(month, (revenue, expenses))| MonthlySlice {
                month,
                revenue,
                expenses,
            })
            .collect();

        Self {
            total_quotations,
            accepted_quotations,
            acceptance_rate,
            total_quoted_value,
            invoices_raised: invoices.len(),
            total_revenue,
            paid_this_month,
            outstanding,
            total_expenses,
            expenses_by_category,
            monthly,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{Tile, TileType};
    use crate::numbering::invoice_from_quotation;

    fn quotation_worth(amount: Decimal, status: QuotationStatus) -> Quotation {
        let mut q = Quotation::new(Utc::now());
        q.status = status;
        q.tiles = vec![Tile {
            category: "Floor Tiles".to_string(),
            group: None,
            cartons: dec!(1),
            sqm: dec!(1),
            tile_type: TileType::Floor,
            unit_price: amount,
            size: None,
        }];
        q
    }

    #[test]
    fn empty_books_produce_zero_metrics() {
        let metrics =
            DashboardMetrics::compute(&[], &[], &[], &Settings::default(), Utc::now());

        assert_eq!(metrics.total_revenue, dec!(0));
        assert_eq!(metrics.acceptance_rate, dec!(0));
        assert_eq!(metrics.monthly.len(), 12);
        assert!(metrics.monthly.iter().all(|m| m.revenue.is_zero()));
    }

    #[test]
    fn revenue_counts_only_paid_invoices() {
        let settings = Settings::default();
        let today = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
        let q = quotation_worth(dec!(5000), QuotationStatus::Accepted);
        let mut paid = invoice_from_quotation(&q, &settings, "INV-2026-0001".to_string(), today);
        paid.status = InvoiceStatus::Paid;
        paid.payment_date = Some(today);
        let unpaid = invoice_from_quotation(&q, &settings, "INV-2026-0002".to_string(), today);

        let metrics =
            DashboardMetrics::compute(&[q], &[paid, unpaid], &[], &settings, today);

        assert_eq!(metrics.total_revenue, dec!(5000));
        assert_eq!(metrics.paid_this_month, dec!(5000));
        assert_eq!(metrics.outstanding, dec!(5000));
        assert_eq!(metrics.invoices_raised, 2);
    }

    #[test]
    fn acceptance_rate_includes_invoiced_quotations() {
        let quotations = vec![
            quotation_worth(dec!(100), QuotationStatus::Accepted),
            quotation_worth(dec!(100), QuotationStatus::Invoiced),
            quotation_worth(dec!(100), QuotationStatus::Pending),
            quotation_worth(dec!(100), QuotationStatus::Rejected),
        ];

        let metrics =
            DashboardMetrics::compute(&quotations, &[], &[], &Settings::default(), Utc::now());

        assert_eq!(metrics.acceptance_rate, dec!(50));
        assert_eq!(metrics.total_quoted_value, dec!(400));
    }

    #[test]
    fn expenses_break_down_by_category() {
        let today = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
        let expenses = vec![
            Expense {
                id: "e1".to_string(),
                date: today,
                category: "Transport".to_string(),
                description: "Site visit".to_string(),
                amount: dec!(2000),
                quotation_id: None,
            },
            Expense {
                id: "e2".to_string(),
                date: today,
                category: "Transport".to_string(),
                description: "Delivery".to_string(),
                amount: dec!(3000),
                quotation_id: None,
            },
            Expense {
                id: "e3".to_string(),
                date: today,
                category: "Tools".to_string(),
                description: "Tile cutter blade".to_string(),
                amount: dec!(1500),
                quotation_id: None,
            },
        ];

        let metrics =
            DashboardMetrics::compute(&[], &[], &expenses, &Settings::default(), today);

        assert_eq!(metrics.total_expenses, dec!(6500));
        assert_eq!(metrics.expenses_by_category["Transport"], dec!(5000));
        assert_eq!(metrics.expenses_by_category["Tools"], dec!(1500));
        let august = metrics.monthly.iter().find(|m| m.month == "2026-08").unwrap();
        assert_eq!(august.expenses, dec!(6500));
    }

    #[test]
    fn year_boundary_months_seed_correctly() {
        let january = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();

        let metrics =
            DashboardMetrics::compute(&[], &[], &[], &Settings::default(), january);

        let months: Vec<_> = metrics.monthly.iter().map(|m| m.month.as_str()).collect();
        assert!(months.contains(&"2025-02"));
        assert!(months.contains(&"2026-01"));
        assert_eq!(months.len(), 12);
    }
}
