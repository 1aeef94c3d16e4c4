use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IllustraError;

/// Number of comparison slots a session holds.
pub const SLOT_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Carrier {
    Lafayette,
    MassMutual,
    Ameritas,
    Guardian,
    OneAmerica,
    Csv,
}

impl Carrier {
    pub const ALL: [Carrier; 6] = [
        Carrier::Lafayette,
        Carrier::MassMutual,
        Carrier::Ameritas,
        Carrier::Guardian,
        Carrier::OneAmerica,
        Carrier::Csv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Carrier::Lafayette => "lafayette",
            Carrier::MassMutual => "massmutual",
            Carrier::Ameritas => "ameritas",
            Carrier::Guardian => "guardian",
            Carrier::OneAmerica => "oneamerica",
            Carrier::Csv => "csv",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Carrier::Lafayette => "Lafayette Life",
            Carrier::MassMutual => "MassMutual",
            Carrier::Ameritas => "Ameritas",
            Carrier::Guardian => "Guardian",
            Carrier::OneAmerica => "One America",
            Carrier::Csv => "CSV import",
        }
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Carrier {
    type Err = IllustraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lower = value.trim().to_lowercase();
        Carrier::ALL
            .into_iter()
            .find(|carrier| carrier.as_str() == lower)
            .ok_or_else(|| IllustraError::UnknownCarrier(value.to_string()))
    }
}

/// One policy year of an illustration, in the shape every carrier is reduced to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IllustrationRow {
    pub year: u32,
    pub age: u32,
    pub annual_premium: Option<f64>,
    #[serde(default)]
    pub cumulative_outlay: Option<f64>,
    pub cash_value: Option<f64>,
    pub death_benefit: Option<f64>,
}

impl IllustrationRow {
    pub fn new(year: u32, age: u32) -> Self {
        Self {
            year,
            age,
            annual_premium: None,
            cumulative_outlay: None,
            cash_value: None,
            death_benefit: None,
        }
    }

    pub fn field(&self, field: RowField) -> Option<f64> {
        match field {
            RowField::Age => Some(self.age as f64),
            RowField::AnnualPremium => self.annual_premium,
            RowField::CumulativeOutlay => self.cumulative_outlay,
            RowField::CashValue => self.cash_value,
            RowField::DeathBenefit => self.death_benefit,
        }
    }
}

/// Row columns that can be read through (and shadowed by) the override layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RowField {
    Age,
    AnnualPremium,
    CumulativeOutlay,
    CashValue,
    DeathBenefit,
}

impl RowField {
    pub const ALL: [RowField; 5] = [
        RowField::Age,
        RowField::AnnualPremium,
        RowField::CumulativeOutlay,
        RowField::CashValue,
        RowField::DeathBenefit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RowField::Age => "age",
            RowField::AnnualPremium => "annualPremium",
            RowField::CumulativeOutlay => "cumulativeOutlay",
            RowField::CashValue => "cashValue",
            RowField::DeathBenefit => "deathBenefit",
        }
    }
}

impl fmt::Display for RowField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RowField {
    type Err = IllustraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        RowField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(trimmed))
            .or(match trimmed.to_lowercase().as_str() {
                "premium" | "annual_premium" => Some(RowField::AnnualPremium),
                "outlay" | "cumulative_outlay" => Some(RowField::CumulativeOutlay),
                "cv" | "cash_value" => Some(RowField::CashValue),
                "db" | "death_benefit" => Some(RowField::DeathBenefit),
                _ => None,
            })
            .ok_or_else(|| IllustraError::UnknownField(value.to_string()))
    }
}

/// Headline figures of an illustration. Rider slots mean different physical
/// riders per carrier but always land in the same five fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IllustrationSummary {
    pub carrier: Carrier,
    pub initial_death_benefit: Option<f64>,
    pub base_annual_premium: Option<f64>,
    pub pua_premium: Option<f64>,
    pub term_premium: Option<f64>,
    pub spua_premium: Option<f64>,
}

impl IllustrationSummary {
    pub fn empty(carrier: Carrier) -> Self {
        Self {
            carrier,
            initial_death_benefit: None,
            base_annual_premium: None,
            pua_premium: None,
            term_premium: None,
            spua_premium: None,
        }
    }

    /// Empty summary whose death benefit is seeded from the first row.
    pub fn seeded(carrier: Carrier, rows: &[IllustrationRow]) -> Self {
        let mut summary = Self::empty(carrier);
        summary.initial_death_benefit = first_row_death_benefit(rows);
        summary
    }

    pub fn get(&self, field: SummaryField) -> Option<f64> {
        match field {
            SummaryField::InitialDeathBenefit => self.initial_death_benefit,
            SummaryField::BaseAnnualPremium => self.base_annual_premium,
            SummaryField::PuaPremium => self.pua_premium,
            SummaryField::TermPremium => self.term_premium,
            SummaryField::SpuaPremium => self.spua_premium,
        }
    }

    pub fn set(&mut self, field: SummaryField, value: Option<f64>) {
        let slot = match field {
            SummaryField::InitialDeathBenefit => &mut self.initial_death_benefit,
            SummaryField::BaseAnnualPremium => &mut self.base_annual_premium,
            SummaryField::PuaPremium => &mut self.pua_premium,
            SummaryField::TermPremium => &mut self.term_premium,
            SummaryField::SpuaPremium => &mut self.spua_premium,
        };
        *slot = value;
    }

    /// Sum of the premium slots that were found; `None` when none were.
    pub fn total_first_year_premium(&self) -> Option<f64> {
        let parts = [
            self.base_annual_premium,
            self.pua_premium,
            self.term_premium,
            self.spua_premium,
        ];
        if parts.iter().all(Option::is_none) {
            return None;
        }
        Some(parts.iter().flatten().sum())
    }
}

pub(crate) fn first_row_death_benefit(rows: &[IllustrationRow]) -> Option<f64> {
    rows.first().and_then(|row| row.death_benefit)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SummaryField {
    InitialDeathBenefit,
    BaseAnnualPremium,
    PuaPremium,
    TermPremium,
    SpuaPremium,
}

impl SummaryField {
    pub const ALL: [SummaryField; 5] = [
        SummaryField::InitialDeathBenefit,
        SummaryField::BaseAnnualPremium,
        SummaryField::PuaPremium,
        SummaryField::TermPremium,
        SummaryField::SpuaPremium,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryField::InitialDeathBenefit => "initialDeathBenefit",
            SummaryField::BaseAnnualPremium => "baseAnnualPremium",
            SummaryField::PuaPremium => "puaPremium",
            SummaryField::TermPremium => "termPremium",
            SummaryField::SpuaPremium => "spuaPremium",
        }
    }
}

impl FromStr for SummaryField {
    type Err = IllustraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        SummaryField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| IllustraError::UnknownField(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Pdf,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSource {
    pub filename: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
}

/// A parsed illustration occupying one comparison slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IllustrationOption {
    pub name: String,
    pub carrier: Carrier,
    pub rows: Vec<IllustrationRow>,
    pub summary: IllustrationSummary,
    pub source: OptionSource,
}

impl IllustrationOption {
    pub fn row(&self, year: u32) -> Option<&IllustrationRow> {
        self.rows.iter().find(|row| row.year == year)
    }

    pub fn last_year(&self) -> Option<u32> {
        self.rows.iter().map(|row| row.year).max()
    }
}

/// Converts a parsed number into a whole, non-negative integer.
pub(crate) fn whole_number(value: f64) -> Option<u32> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return None;
    }
    Some(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carrier_ids_roundtrip() {
        for carrier in Carrier::ALL {
            assert_eq!(carrier.as_str().parse::<Carrier>().unwrap(), carrier);
        }
        assert_eq!(" MassMutual ".parse::<Carrier>().unwrap(), Carrier::MassMutual);
        assert!("prudential".parse::<Carrier>().is_err());
    }

    #[test]
    fn carrier_serializes_lowercase() {
        let json = serde_json::to_string(&Carrier::OneAmerica).unwrap();
        assert_eq!(json, "\"oneamerica\"");
    }

    #[test]
    fn row_serializes_camel_case() {
        let mut row = IllustrationRow::new(1, 45);
        row.cash_value = Some(100.0);
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["cashValue"], 100.0);
        assert!(value["annualPremium"].is_null());
    }

    #[test]
    fn row_field_aliases_parse() {
        assert_eq!("cashValue".parse::<RowField>().unwrap(), RowField::CashValue);
        assert_eq!("cv".parse::<RowField>().unwrap(), RowField::CashValue);
        assert_eq!("premium".parse::<RowField>().unwrap(), RowField::AnnualPremium);
        assert!("surrender".parse::<RowField>().is_err());
    }

    #[test]
    fn summary_total_skips_missing_parts() {
        let mut summary = IllustrationSummary::empty(Carrier::Guardian);
        assert_eq!(summary.total_first_year_premium(), None);
        summary.set(SummaryField::BaseAnnualPremium, Some(8250.0));
        summary.set(SummaryField::TermPremium, Some(581.56));
        assert_eq!(summary.total_first_year_premium(), Some(8831.56));
    }

    #[test]
    fn whole_number_rejects_fractions() {
        assert_eq!(whole_number(45.0), Some(45));
        assert_eq!(whole_number(45.5), None);
        assert_eq!(whole_number(-1.0), None);
    }
}
