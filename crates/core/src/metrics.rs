use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IllustraError;
use crate::model::{IllustrationRow, RowField};
use crate::overrides::OverrideMap;

const IRR_INITIAL_GUESS: f64 = 0.05;
const IRR_MAX_ITERATIONS: usize = 100;
const IRR_TOLERANCE: f64 = 1e-4;
const IRR_MIN: f64 = -0.99;
const IRR_MAX: f64 = 10.0;

/// Everything a comparison table column can show for an option and year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Age,
    AnnualPremium,
    CumulativeOutlay,
    CashValue,
    DeathBenefit,
    CashValueIncrease,
    CashValueEfficiency,
    Irr,
}

impl Metric {
    pub const BASE: [Metric; 5] = [
        Metric::Age,
        Metric::AnnualPremium,
        Metric::CumulativeOutlay,
        Metric::CashValue,
        Metric::DeathBenefit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Age => "age",
            Metric::AnnualPremium => "annualPremium",
            Metric::CumulativeOutlay => "cumulativeOutlay",
            Metric::CashValue => "cashValue",
            Metric::DeathBenefit => "deathBenefit",
            Metric::CashValueIncrease => "cashValueIncrease",
            Metric::CashValueEfficiency => "cashValueEfficiency",
            Metric::Irr => "irr",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Age => "Age",
            Metric::AnnualPremium => "Annual Premium",
            Metric::CumulativeOutlay => "Cumulative Outlay",
            Metric::CashValue => "Cash Value",
            Metric::DeathBenefit => "Death Benefit",
            Metric::CashValueIncrease => "Cash Value Increase",
            Metric::CashValueEfficiency => "Cash Value Efficiency",
            Metric::Irr => "IRR",
        }
    }

    /// Row column backing this metric; `None` for derived metrics.
    pub fn row_field(&self) -> Option<RowField> {
        match self {
            Metric::Age => Some(RowField::Age),
            Metric::AnnualPremium => Some(RowField::AnnualPremium),
            Metric::CumulativeOutlay => Some(RowField::CumulativeOutlay),
            Metric::CashValue => Some(RowField::CashValue),
            Metric::DeathBenefit => Some(RowField::DeathBenefit),
            _ => None,
        }
    }

    pub fn is_ratio(&self) -> bool {
        matches!(self, Metric::CashValueEfficiency | Metric::Irr)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = IllustraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        [
            Metric::CashValueIncrease,
            Metric::CashValueEfficiency,
            Metric::Irr,
        ]
        .into_iter()
        .chain(Metric::BASE)
        .find(|metric| metric.as_str().eq_ignore_ascii_case(trimmed))
        .ok_or_else(|| IllustraError::UnknownField(value.to_string()))
    }
}

/// Overridden cash value minus the previous year's (zero when there is no
/// previous row). `None` when this year's cash value is missing.
pub fn cash_value_increase(
    overrides: &OverrideMap,
    slot: usize,
    row: &IllustrationRow,
    previous: Option<&IllustrationRow>,
) -> Option<f64> {
    let current = overrides.value(slot, row, RowField::CashValue)?;
    let previous = previous
        .and_then(|prev| overrides.value(slot, prev, RowField::CashValue))
        .unwrap_or(0.0);
    Some(current - previous)
}

/// Overridden cash value over overridden cumulative outlay; `None` when the
/// outlay is zero or missing. A missing cash value counts as zero.
pub fn cash_value_efficiency(
    overrides: &OverrideMap,
    slot: usize,
    row: &IllustrationRow,
) -> Option<f64> {
    let outlay = overrides
        .value(slot, row, RowField::CumulativeOutlay)
        .filter(|outlay| *outlay != 0.0)?;
    let cash_value = overrides
        .value(slot, row, RowField::CashValue)
        .unwrap_or(0.0);
    Some(cash_value / outlay)
}

/// Surrender cash flows for every row up to `upto`: each year pays its
/// premium, the last year also receives the cash value. Missing values count
/// as zero.
pub fn surrender_cash_flows(
    overrides: &OverrideMap,
    slot: usize,
    rows: &[IllustrationRow],
    upto: &IllustrationRow,
) -> Vec<f64> {
    let included: Vec<&IllustrationRow> = rows.iter().filter(|row| row.year <= upto.year).collect();
    let last = included.len().saturating_sub(1);
    included
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let premium = overrides
                .value(slot, row, RowField::AnnualPremium)
                .unwrap_or(0.0);
            if idx == last {
                let cash_value = overrides.value(slot, row, RowField::CashValue).unwrap_or(0.0);
                cash_value - premium
            } else {
                -premium
            }
        })
        .collect()
}

/// Implied annual return if the policy is surrendered at `upto`.
pub fn irr(
    overrides: &OverrideMap,
    slot: usize,
    rows: &[IllustrationRow],
    upto: &IllustrationRow,
) -> Option<f64> {
    solve_irr(&surrender_cash_flows(overrides, slot, rows, upto))
}

/// Newton-Raphson on the NPV of `cash_flows` (index = period).
///
/// Starts at 5%, stops once |NPV| < 1e-4, clamps every step to [-0.99, 10].
/// Returns `None` if the derivative vanishes; after 100 iterations the last
/// estimate is returned even if it has not converged.
pub fn solve_irr(cash_flows: &[f64]) -> Option<f64> {
    let mut rate = IRR_INITIAL_GUESS;
    for _ in 0..IRR_MAX_ITERATIONS {
        let mut npv = 0.0_f64;
        let mut derivative = 0.0_f64;
        for (t, cf) in cash_flows.iter().enumerate() {
            let t = t as f64;
            npv += cf / (1.0 + rate).powf(t);
            derivative -= t * cf / (1.0 + rate).powf(t + 1.0);
        }
        if npv.abs() < IRR_TOLERANCE {
            return Some(rate);
        }
        if derivative == 0.0 {
            return None;
        }
        rate = (rate - npv / derivative).clamp(IRR_MIN, IRR_MAX);
    }
    tracing::debug!(rate, "irr did not converge");
    Some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: u32, premium: Option<f64>, cash_value: Option<f64>) -> IllustrationRow {
        let mut row = IllustrationRow::new(year, 44 + year);
        row.annual_premium = premium;
        row.cash_value = cash_value;
        row
    }

    #[test]
    fn irr_of_five_percent_growth() {
        let rows = vec![row(1, Some(1000.0), Some(0.0)), row(2, Some(1000.0), Some(2050.0))];
        let overrides = OverrideMap::new();
        assert_eq!(
            surrender_cash_flows(&overrides, 0, &rows, &rows[1]),
            vec![-1000.0, 1050.0]
        );
        let rate = irr(&overrides, 0, &rows, &rows[1]).unwrap();
        assert!((rate - 0.05).abs() < 1e-3, "rate {rate}");
    }

    #[test]
    fn irr_uses_overrides() {
        let rows = vec![row(1, Some(1000.0), Some(0.0)), row(2, Some(1000.0), Some(0.0))];
        let mut overrides = OverrideMap::new();
        overrides.set(0, 2, RowField::CashValue, 2100.0);
        let rate = irr(&overrides, 0, &rows, &rows[1]).unwrap();
        assert!((rate - 0.1).abs() < 1e-3, "rate {rate}");
    }

    #[test]
    fn zero_derivative_has_no_solution() {
        assert_eq!(solve_irr(&[5.0]), None);
    }

    #[test]
    fn divergent_flows_stay_clamped() {
        let rate = solve_irr(&[-1000.0, -1000.0, -1000.0, 0.0]).unwrap();
        assert!((IRR_MIN..=IRR_MAX).contains(&rate));
    }

    #[test]
    fn increase_against_missing_previous_row() {
        let overrides = OverrideMap::new();
        let current = row(1, Some(1000.0), Some(700.0));
        assert_eq!(cash_value_increase(&overrides, 0, &current, None), Some(700.0));
        let previous = row(1, None, None);
        let next = row(2, None, Some(900.0));
        assert_eq!(cash_value_increase(&overrides, 0, &next, Some(&previous)), Some(900.0));
        assert_eq!(cash_value_increase(&overrides, 0, &previous, None), None);
    }

    #[test]
    fn efficiency_needs_outlay() {
        let overrides = OverrideMap::new();
        let mut current = row(1, Some(1000.0), Some(500.0));
        assert_eq!(cash_value_efficiency(&overrides, 0, &current), None);
        current.cumulative_outlay = Some(2000.0);
        assert_eq!(cash_value_efficiency(&overrides, 0, &current), Some(0.25));
        current.cumulative_outlay = Some(0.0);
        assert_eq!(cash_value_efficiency(&overrides, 0, &current), None);
    }

    #[test]
    fn efficiency_without_cash_value_is_zero() {
        let overrides = OverrideMap::new();
        let mut current = row(1, Some(1000.0), None);
        current.cumulative_outlay = Some(1000.0);
        assert_eq!(cash_value_efficiency(&overrides, 0, &current), Some(0.0));
        current.cumulative_outlay = Some(0.0);
        assert_eq!(cash_value_efficiency(&overrides, 0, &current), None);
    }

    #[test]
    fn metric_names_parse() {
        assert_eq!("irr".parse::<Metric>().unwrap(), Metric::Irr);
        assert_eq!("CashValue".parse::<Metric>().unwrap(), Metric::CashValue);
        assert!("surrender".parse::<Metric>().is_err());
    }
}
