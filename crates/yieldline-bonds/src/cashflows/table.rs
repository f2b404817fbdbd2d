//! Tabular export of an instrument's cash flows.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use yieldline_core::Date;

/// One dated row of a cash-flow table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRow {
    /// Payment (or settlement) date.
    pub date: Date,
    /// Net flow on the date, the price being negative.
    pub flow: f64,
    /// Coupon part of the payment.
    pub coupon: f64,
    /// Principal part of the payment.
    pub amortization: f64,
    /// `coupon + amortization - flow`; the price paid on settlement.
    pub cost: f64,
}

/// Cash flows of an instrument by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowTable {
    rows: Vec<CashFlowRow>,
}

impl CashFlowTable {
    /// Joins flows, coupons and amortization on their dates.
    ///
    /// A component missing on a date counts as zero.
    #[must_use]
    pub fn from_components(
        flows: &BTreeMap<Date, f64>,
        coupons: &BTreeMap<Date, f64>,
        amortization: &BTreeMap<Date, f64>,
    ) -> Self {
        let mut dates: Vec<Date> = flows
            .keys()
            .chain(coupons.keys())
            .chain(amortization.keys())
            .copied()
            .collect();
        dates.sort_unstable();
        dates.dedup();

        let value = |map: &BTreeMap<Date, f64>, date: &Date| map.get(date).copied().unwrap_or(0.0);
        let rows = dates
            .into_iter()
            .map(|date| {
                let flow = value(flows, &date);
                let coupon = value(coupons, &date);
                let amortization = value(amortization, &date);
                CashFlowRow {
                    date,
                    flow,
                    coupon,
                    amortization,
                    cost: coupon + amortization - flow,
                }
            })
            .collect();
        Self { rows }
    }

    /// Rows sorted by date.
    #[must_use]
    pub fn rows(&self) -> &[CashFlowRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row on `date`, if any.
    #[must_use]
    pub fn row(&self, date: Date) -> Option<&CashFlowRow> {
        self.rows
            .binary_search_by(|row| row.date.cmp(&date))
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Sum of the net flows.
    #[must_use]
    pub fn total_flow(&self) -> f64 {
        self.rows.iter().map(|row| row.flow).sum()
    }
}

impl fmt::Display for CashFlowTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<12} {:>14} {:>14} {:>14} {:>14}",
            "Date", "Flows", "Coupon", "Amortization", "Cost"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<12} {:>14.6} {:>14.6} {:>14.6} {:>14.6}",
                row.date.to_string(),
                row.flow,
                row.coupon,
                row.amortization,
                row.cost
            )?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a CashFlowTable {
    type Item = &'a CashFlowRow;
    type IntoIter = std::slice::Iter<'a, CashFlowRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_cost_is_price_on_settlement() {
        let flows: BTreeMap<Date, f64> = [(d(2020, 1, 1), -98.0), (d(2021, 1, 1), 105.0)]
            .into_iter()
            .collect();
        let coupons: BTreeMap<Date, f64> = [(d(2021, 1, 1), 5.0)].into_iter().collect();
        let amortization: BTreeMap<Date, f64> = [(d(2021, 1, 1), 100.0)].into_iter().collect();

        let table = CashFlowTable::from_components(&flows, &coupons, &amortization);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].cost, 98.0);
        assert_eq!(table.row(d(2021, 1, 1)).unwrap().cost, 0.0);
        assert_eq!(table.total_flow(), 7.0);
        assert!(table.row(d(2020, 6, 1)).is_none());
    }

    #[test]
    fn test_table_serializes_and_prints() {
        let flows: BTreeMap<Date, f64> = [(d(2021, 1, 1), 105.0)].into_iter().collect();
        let table = CashFlowTable::from_components(&flows, &BTreeMap::new(), &BTreeMap::new());

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["rows"][0]["flow"], 105.0);
        assert_eq!(json["rows"][0]["cost"], -105.0);

        let text = table.to_string();
        assert!(text.starts_with("Date"));
        assert!(text.contains("2021-01-01"));
    }
}
