use std::ops::RangeInclusive;

use regex::Regex;
use rustc_hash::FxHashSet;

use crate::document::{page_lines, IllustrationDocument};
use crate::error::Result;
use crate::model::{whole_number, IllustrationRow};
use crate::tokens::{parse_number, tokenize};

/// Position of a column in a tokenized row. Negative values count from the end,
/// so `-1` is the last token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex(pub isize);

impl ColumnIndex {
    pub fn resolve(self, len: usize) -> Option<usize> {
        if self.0 >= 0 {
            let idx = self.0 as usize;
            (idx < len).then_some(idx)
        } else {
            len.checked_sub(self.0.unsigned_abs())
        }
    }

    pub fn read(self, tokens: &[String]) -> Option<f64> {
        self.resolve(tokens.len())
            .and_then(|idx| parse_number(&tokens[idx]))
    }
}

/// Where each row field sits in a carrier's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub year: ColumnIndex,
    pub age: ColumnIndex,
    pub premium: ColumnIndex,
    pub cash_value: ColumnIndex,
    pub death_benefit: ColumnIndex,
}

impl ColumnMap {
    pub const fn new(
        year: isize,
        age: isize,
        premium: isize,
        cash_value: isize,
        death_benefit: isize,
    ) -> Self {
        Self {
            year: ColumnIndex(year),
            age: ColumnIndex(age),
            premium: ColumnIndex(premium),
            cash_value: ColumnIndex(cash_value),
            death_benefit: ColumnIndex(death_benefit),
        }
    }

    /// Reads a full row; `None` when year or age is missing or not a whole number.
    pub fn read_row(&self, tokens: &[String]) -> Option<IllustrationRow> {
        let (year, age) = self.read_key(tokens)?;
        let mut row = IllustrationRow::new(year, age);
        row.annual_premium = self.premium.read(tokens);
        row.cash_value = self.cash_value.read(tokens);
        row.death_benefit = self.death_benefit.read(tokens);
        Some(row)
    }

    pub fn read_key(&self, tokens: &[String]) -> Option<(u32, u32)> {
        let year = self.year.read(tokens).and_then(whole_number)?;
        let age = self.age.read(tokens).and_then(whole_number)?;
        Some((year, age))
    }
}

/// Accepted year and age ranges for a carrier's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBounds {
    pub max_year: u32,
    pub min_age: u32,
    pub max_age: u32,
}

impl RowBounds {
    pub const fn new(max_year: u32, max_age: u32) -> Self {
        Self {
            max_year,
            min_age: 18,
            max_age,
        }
    }

    pub fn accepts(&self, year: u32, age: u32) -> bool {
        (1..=self.max_year).contains(&year) && (self.min_age..=self.max_age).contains(&age)
    }
}

/// A carrier's data-row recognizer and column layout.
#[derive(Debug, Clone)]
pub struct TableLayout {
    pub row_start: Regex,
    pub min_tokens: usize,
    pub columns: ColumnMap,
    pub bounds: RowBounds,
}

impl TableLayout {
    /// Tokens of `line` if it looks like a data row of this layout.
    pub fn row_tokens(&self, line: &str) -> Option<Vec<String>> {
        row_tokens(&self.row_start, self.min_tokens, line)
    }

    pub fn read_row(&self, line: &str) -> Option<IllustrationRow> {
        let tokens = self.row_tokens(line)?;
        let row = self.columns.read_row(&tokens)?;
        self.bounds.accepts(row.year, row.age).then_some(row)
    }
}

pub(crate) fn row_tokens(row_start: &Regex, min_tokens: usize, line: &str) -> Option<Vec<String>> {
    if !row_start.is_match(line) {
        return None;
    }
    let tokens = tokenize(line);
    if tokens.len() < min_tokens {
        tracing::debug!(
            found = tokens.len(),
            need = min_tokens,
            line,
            "skipped row: not enough tokens"
        );
        return None;
    }
    Some(tokens)
}

/// Inclusive page window clamped to the document.
pub fn page_window(start: u32, end: u32, page_count: u32) -> RangeInclusive<u32> {
    start.max(1)..=end.min(page_count)
}

/// Accumulates rows across pages; the first row seen for a year wins.
#[derive(Debug, Default)]
pub struct TableScan {
    rows: Vec<IllustrationRow>,
    seen_years: FxHashSet<u32>,
}

impl TableScan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_year(&self, year: u32) -> bool {
        self.seen_years.contains(&year)
    }

    pub fn push(&mut self, row: IllustrationRow) -> bool {
        if !self.seen_years.insert(row.year) {
            tracing::debug!(year = row.year, "skipped row: duplicate year");
            return false;
        }
        tracing::debug!(
            year = row.year,
            age = row.age,
            premium = ?row.annual_premium,
            cash_value = ?row.cash_value,
            death_benefit = ?row.death_benefit,
            "accepted row"
        );
        self.rows.push(row);
        true
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows ordered by year.
    pub fn finish(mut self) -> Vec<IllustrationRow> {
        self.rows.sort_by_key(|row| row.year);
        self.rows
    }
}

/// Walks `pages` in order and collects every line `layout` accepts.
pub async fn scan_table(
    doc: &dyn IllustrationDocument,
    pages: impl IntoIterator<Item = u32> + Send,
    layout: &TableLayout,
) -> Result<Vec<IllustrationRow>> {
    let mut scan = TableScan::new();
    for page in pages {
        let lines = page_lines(doc, page).await?;
        for line in &lines {
            if let Some(row) = layout.read_row(line) {
                scan.push(row);
            }
        }
    }
    Ok(scan.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use futures::executor::block_on;

    fn layout() -> TableLayout {
        TableLayout {
            row_start: Regex::new(r"^\d+\s+\d+").unwrap(),
            min_tokens: 5,
            columns: ColumnMap::new(1, 0, 2, -2, -1),
            bounds: RowBounds::new(121, 121),
        }
    }

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn negative_columns_count_from_end() {
        let row = tokens(&["45", "3", "2500.00", "18000.00", "500000.00"]);
        assert_eq!(ColumnIndex(-1).read(&row), Some(500000.0));
        assert_eq!(ColumnIndex(-2).read(&row), Some(18000.0));
        assert_eq!(ColumnIndex(-6).resolve(row.len()), None);
        assert_eq!(ColumnIndex(5).resolve(row.len()), None);
    }

    #[test]
    fn bounds_reject_edges() {
        let bounds = RowBounds::new(121, 121);
        assert!(bounds.accepts(1, 45));
        assert!(!bounds.accepts(0, 45));
        assert!(!bounds.accepts(1, 17));
        assert!(!bounds.accepts(1, 122));
        assert!(!bounds.accepts(122, 60));
    }

    #[test]
    fn scan_keeps_first_row_per_year() {
        let doc = MemoryDocument::from_lines(&[
            vec!["Age Year Premium", "45 1 1,000.00 0.00 250,000.00", "45 1 9.00 9.00 9.00"],
            vec!["46 2 1,000.00 800.00 250,000.00", "17 3 1.00 1.00 1.00"],
        ]);
        let rows = block_on(scan_table(&doc, 1..=2, &layout())).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].annual_premium, Some(1000.0));
        assert_eq!(rows[1].cash_value, Some(800.0));
    }

    #[test]
    fn short_rows_are_skipped() {
        assert!(layout().read_row("45 1 1,000.00").is_none());
        assert!(layout().read_row("Page 12 of 18").is_none());
    }

    #[test]
    fn window_clamps_to_document() {
        assert_eq!(page_window(10, 20, 14), 10..=14);
        assert_eq!(page_window(0, 3, 14), 1..=3);
        assert!(page_window(12, 20, 8).is_empty());
    }
}
