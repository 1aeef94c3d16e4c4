use std::collections::BTreeSet;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::config::ParseOptions;
use crate::csv_import::import_csv;
use crate::document::IllustrationDocument;
use crate::error::{IllustraError, Result};
use crate::ingest::parse_illustration;
use crate::metrics::{cash_value_efficiency, cash_value_increase, irr, Metric};
use crate::model::{
    Carrier, IllustrationOption, OptionSource, RowField, SourceKind, SummaryField, SLOT_COUNT,
};
use crate::overrides::OverrideMap;

/// Which derived columns are switched on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toggles {
    #[serde(default, alias = "cash_increase")]
    pub cash_increase: bool,
    #[serde(default)]
    pub efficiency: bool,
    #[serde(default)]
    pub irr: bool,
}

impl Toggles {
    /// Base columns followed by the enabled derived ones.
    pub fn metrics(&self) -> Vec<Metric> {
        let mut metrics = Metric::BASE.to_vec();
        if self.cash_increase {
            metrics.push(Metric::CashValueIncrease);
        }
        if self.efficiency {
            metrics.push(Metric::CashValueEfficiency);
        }
        if self.irr {
            metrics.push(Metric::Irr);
        }
        metrics
    }
}

/// Everything needed to bring a comparison back: the persisted shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSnapshot {
    pub name: String,
    #[serde(default)]
    pub options: Vec<Option<IllustrationOption>>,
    #[serde(default)]
    pub overrides: OverrideMap,
    #[serde(default)]
    pub toggles: Toggles,
}

/// Up to three illustrations side by side plus the user's corrections.
#[derive(Debug, Clone, Default)]
pub struct ComparisonSession {
    options: [Option<IllustrationOption>; SLOT_COUNT],
    overrides: OverrideMap,
    toggles: Toggles,
    year_cap: Option<u32>,
}

fn check_slot(slot: usize) -> Result<()> {
    if slot >= SLOT_COUNT {
        return Err(IllustraError::InvalidSlot(slot));
    }
    Ok(())
}

impl ComparisonSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn option(&self, slot: usize) -> Result<Option<&IllustrationOption>> {
        check_slot(slot)?;
        Ok(self.options[slot].as_ref())
    }

    /// Occupied slots in slot order.
    pub fn loaded(&self) -> impl Iterator<Item = (usize, &IllustrationOption)> {
        self.options
            .iter()
            .enumerate()
            .filter_map(|(slot, option)| option.as_ref().map(|option| (slot, option)))
    }

    pub fn overrides(&self) -> &OverrideMap {
        &self.overrides
    }

    pub fn toggles(&self) -> Toggles {
        self.toggles
    }

    pub fn set_toggles(&mut self, toggles: Toggles) {
        self.toggles = toggles;
    }

    pub fn year_cap(&self) -> Option<u32> {
        self.year_cap
    }

    pub fn set_year_cap(&mut self, cap: Option<u32>) {
        self.year_cap = cap;
    }

    /// Parses `doc` with the carrier's parser and puts the result in `slot`.
    ///
    /// The slot is only replaced once the whole parse succeeded; on error the
    /// session is left as it was.
    pub async fn ingest_pdf(
        &mut self,
        slot: usize,
        carrier: Carrier,
        name: Option<&str>,
        filename: &str,
        doc: &dyn IllustrationDocument,
        opts: &ParseOptions,
    ) -> Result<&IllustrationOption> {
        check_slot(slot)?;
        let parsed = parse_illustration(carrier, doc, opts).await?;
        let name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(filename)
            .to_string();
        let option = IllustrationOption {
            name,
            carrier,
            rows: parsed.rows,
            summary: parsed.summary,
            source: OptionSource {
                filename: filename.to_string(),
                kind: SourceKind::Pdf,
            },
        };
        if option.rows.is_empty() {
            tracing::warn!(slot, %carrier, "parse produced no rows");
        }
        self.set_option(slot, option)?;
        self.options[slot]
            .as_ref()
            .ok_or(IllustraError::EmptySlot(slot))
    }

    /// Replaces a slot wholesale. Overrides of the previous occupant go too.
    pub fn set_option(&mut self, slot: usize, option: IllustrationOption) -> Result<()> {
        check_slot(slot)?;
        let dropped = self.overrides.clear_slot(slot);
        tracing::info!(slot, name = %option.name, rows = option.rows.len(), dropped_overrides = dropped, "option set");
        self.options[slot] = Some(option);
        self.auto_match_years();
        Ok(())
    }

    /// Empties a slot and drops its overrides.
    pub fn clear_option(&mut self, slot: usize) -> Result<Option<IllustrationOption>> {
        check_slot(slot)?;
        self.overrides.clear_slot(slot);
        let previous = self.options[slot].take();
        self.auto_match_years();
        Ok(previous)
    }

    /// Imports every block of a comparison CSV; returns the slots filled.
    pub fn import_csv<R: Read>(&mut self, reader: R, filename: &str) -> Result<Vec<usize>> {
        let imported = import_csv(reader, filename)?;
        let mut slots = Vec::with_capacity(imported.len());
        for item in imported {
            slots.push(item.slot);
            self.set_option(item.slot, item.option)?;
        }
        Ok(slots)
    }

    pub fn set_summary_field(
        &mut self,
        slot: usize,
        field: SummaryField,
        value: Option<f64>,
    ) -> Result<()> {
        check_slot(slot)?;
        let option = self.options[slot]
            .as_mut()
            .ok_or(IllustraError::EmptySlot(slot))?;
        option.summary.set(field, value);
        Ok(())
    }

    pub fn set_override(&mut self, slot: usize, year: u32, field: RowField, value: f64) -> Result<()> {
        check_slot(slot)?;
        self.overrides.set(slot, year, field, value);
        Ok(())
    }

    /// Clears all overrides, or just one slot's.
    pub fn reset_overrides(&mut self, slot: Option<usize>) -> Result<usize> {
        match slot {
            Some(slot) => {
                check_slot(slot)?;
                Ok(self.overrides.clear_slot(slot))
            }
            None => {
                let removed = self.overrides.len();
                self.overrides.clear();
                Ok(removed)
            }
        }
    }

    /// Every year any loaded option has a row for, ascending.
    pub fn merged_years(&self) -> Vec<u32> {
        let years: BTreeSet<u32> = self
            .loaded()
            .flat_map(|(_, option)| option.rows.iter().map(|row| row.year))
            .collect();
        years.into_iter().collect()
    }

    fn last_years(&self) -> Vec<u32> {
        self.loaded()
            .filter_map(|(_, option)| option.last_year())
            .collect()
    }

    /// Default cap: the shortest option's last year once two or more are
    /// loaded, the only option's last year otherwise.
    pub fn auto_match_years(&mut self) {
        let last_years = self.last_years();
        self.year_cap = match last_years.len() {
            0 => None,
            1 => last_years.first().copied(),
            _ => last_years.iter().min().copied(),
        };
    }

    /// Caps at the shortest option; needs at least two options.
    pub fn match_years(&mut self) -> bool {
        let last_years = self.last_years();
        if last_years.len() < 2 {
            return false;
        }
        self.year_cap = last_years.iter().min().copied();
        true
    }

    /// Raises the cap to the longest option.
    pub fn show_all_years(&mut self) -> bool {
        let last_years = self.last_years();
        if last_years.is_empty() {
            return false;
        }
        self.year_cap = last_years.iter().max().copied();
        true
    }

    /// Merged years within the current cap.
    pub fn visible_years(&self) -> Vec<u32> {
        let cap = self.year_cap;
        self.merged_years()
            .into_iter()
            .filter(|year| cap.map_or(true, |cap| *year <= cap))
            .collect()
    }

    /// Value of one table cell, overrides applied. `None` when the option has
    /// no row for `year` or the value is unknown.
    pub fn metric_value(&self, slot: usize, year: u32, metric: Metric) -> Option<f64> {
        let option = self.options.get(slot)?.as_ref()?;
        let row = option.row(year)?;
        if let Some(field) = metric.row_field() {
            return self.overrides.value(slot, row, field);
        }
        match metric {
            Metric::CashValueIncrease => {
                let previous = year.checked_sub(1).and_then(|prev| option.row(prev));
                cash_value_increase(&self.overrides, slot, row, previous)
            }
            Metric::CashValueEfficiency => cash_value_efficiency(&self.overrides, slot, row),
            Metric::Irr => irr(&self.overrides, slot, &option.rows, row),
            _ => None,
        }
    }

    pub fn snapshot(&self, name: &str) -> ComparisonSnapshot {
        ComparisonSnapshot {
            name: name.to_string(),
            options: self.options.to_vec(),
            overrides: self.overrides.clone(),
            toggles: self.toggles,
        }
    }

    /// Replaces the whole session state with a saved comparison.
    pub fn restore(&mut self, snapshot: ComparisonSnapshot) {
        let mut options: [Option<IllustrationOption>; SLOT_COUNT] = Default::default();
        for (slot, option) in snapshot.options.into_iter().take(SLOT_COUNT).enumerate() {
            options[slot] = option;
        }
        self.options = options;
        self.overrides = snapshot.overrides;
        self.toggles = snapshot.toggles;
        self.auto_match_years();
        tracing::info!(name = %snapshot.name, loaded = self.loaded().count(), "restored comparison");
    }

    pub fn from_snapshot(snapshot: ComparisonSnapshot) -> Self {
        let mut session = Self::new();
        session.restore(snapshot);
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use crate::model::{IllustrationRow, IllustrationSummary};
    use futures::executor::block_on;

    fn option(name: &str, years: u32) -> IllustrationOption {
        let rows = (1..=years)
            .map(|year| {
                let mut row = IllustrationRow::new(year, 44 + year);
                row.annual_premium = Some(1000.0);
                row.cumulative_outlay = Some(1000.0 * year as f64);
                row.cash_value = Some(900.0 * year as f64);
                row
            })
            .collect();
        IllustrationOption {
            name: name.to_string(),
            carrier: Carrier::Csv,
            rows,
            summary: IllustrationSummary::empty(Carrier::Csv),
            source: OptionSource {
                filename: "test.csv".to_string(),
                kind: SourceKind::Csv,
            },
        }
    }

    #[test]
    fn year_cap_follows_shortest_option() {
        let mut session = ComparisonSession::new();
        session.set_option(0, option("a", 10)).unwrap();
        assert_eq!(session.year_cap(), Some(10));
        session.set_option(2, option("b", 4)).unwrap();
        assert_eq!(session.year_cap(), Some(4));
        assert_eq!(session.visible_years(), vec![1, 2, 3, 4]);
        assert!(session.show_all_years());
        assert_eq!(session.visible_years().len(), 10);
        assert!(session.match_years());
        assert_eq!(session.year_cap(), Some(4));
        assert_eq!(session.merged_years().len(), 10);
    }

    #[test]
    fn clearing_an_option_clears_its_overrides_only() {
        let mut session = ComparisonSession::new();
        session.set_option(0, option("a", 3)).unwrap();
        session.set_option(1, option("b", 3)).unwrap();
        session.set_override(0, 2, RowField::CashValue, 5.0).unwrap();
        session.set_override(1, 2, RowField::CashValue, 6.0).unwrap();
        let removed = session.clear_option(0).unwrap();
        assert_eq!(removed.map(|o| o.name), Some("a".to_string()));
        assert!(!session.overrides().contains(0, 2, RowField::CashValue));
        assert_eq!(session.metric_value(1, 2, Metric::CashValue), Some(6.0));
    }

    #[test]
    fn resetting_overrides_keeps_options() {
        let mut session = ComparisonSession::new();
        session.set_option(0, option("a", 3)).unwrap();
        session.set_override(0, 1, RowField::AnnualPremium, 1.0).unwrap();
        assert_eq!(session.reset_overrides(None).unwrap(), 1);
        assert!(session.option(0).unwrap().is_some());
        assert!(matches!(session.reset_overrides(Some(3)), Err(IllustraError::InvalidSlot(3))));
    }

    #[test]
    fn derived_metrics_read_overrides() {
        let mut session = ComparisonSession::new();
        session.set_option(0, option("a", 3)).unwrap();
        assert_eq!(session.metric_value(0, 2, Metric::CashValueIncrease), Some(900.0));
        session.set_override(0, 2, RowField::CashValue, 2000.0).unwrap();
        assert_eq!(session.metric_value(0, 2, Metric::CashValueIncrease), Some(1100.0));
        assert_eq!(session.metric_value(0, 2, Metric::CashValueEfficiency), Some(1.0));
        assert!(session.metric_value(0, 3, Metric::Irr).is_some());
        assert_eq!(session.metric_value(0, 9, Metric::CashValue), None);
        assert_eq!(session.metric_value(1, 1, Metric::CashValue), None);
    }

    #[test]
    fn failed_parse_leaves_slot_untouched() {
        let mut session = ComparisonSession::new();
        session.set_option(0, option("kept", 2)).unwrap();
        let doc = MemoryDocument::blank(1);
        let result = block_on(session.ingest_pdf(
            0,
            Carrier::Csv,
            None,
            "x.pdf",
            &doc,
            &ParseOptions::default(),
        ));
        assert!(result.is_err());
        assert_eq!(session.option(0).unwrap().map(|o| o.name.as_str()), Some("kept"));
    }

    #[test]
    fn ingest_defaults_name_to_filename() {
        let mut session = ComparisonSession::new();
        let doc = MemoryDocument::blank(12).with_page_lines(12, &["1 45 25,000.00 0.00 18,250.00 2,000,000"]);
        let option = block_on(session.ingest_pdf(
            1,
            Carrier::Guardian,
            Some("  "),
            "guardian.pdf",
            &doc,
            &ParseOptions::default(),
        ))
        .unwrap();
        assert_eq!(option.name, "guardian.pdf");
        assert_eq!(option.source.kind, SourceKind::Pdf);
        assert_eq!(option.rows.len(), 1);
    }

    #[test]
    fn summary_edits_require_an_option() {
        let mut session = ComparisonSession::new();
        assert!(matches!(
            session.set_summary_field(1, SummaryField::SpuaPremium, Some(1.0)),
            Err(IllustraError::EmptySlot(1))
        ));
        session.set_option(1, option("b", 1)).unwrap();
        session.set_summary_field(1, SummaryField::SpuaPremium, Some(25_000.0)).unwrap();
        let summary = &session.option(1).unwrap().unwrap().summary;
        assert_eq!(summary.spua_premium, Some(25_000.0));
    }

    #[test]
    fn snapshot_roundtrips_through_json() {
        let mut session = ComparisonSession::new();
        session.set_option(2, option("c", 2)).unwrap();
        session.set_override(2, 1, RowField::DeathBenefit, 1.0).unwrap();
        session.set_toggles(Toggles { cash_increase: true, efficiency: false, irr: true });
        let json = serde_json::to_string(&session.snapshot("mine")).unwrap();
        assert!(json.contains("\"2:1:deathBenefit\""));
        assert!(json.contains("\"cashIncrease\":true"));

        let restored = ComparisonSession::from_snapshot(serde_json::from_str(&json).unwrap());
        assert!(restored.option(0).unwrap().is_none());
        assert_eq!(restored.option(2).unwrap().map(|o| o.rows.len()), Some(2));
        assert_eq!(restored.metric_value(2, 1, Metric::DeathBenefit), Some(1.0));
        assert_eq!(
            restored.toggles().metrics().last(),
            Some(&Metric::Irr)
        );
    }
}
