use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::summary::{capture_amount, first_capture, nonzero};
use super::table::{page_window, row_tokens, ColumnIndex, ColumnMap, RowBounds, TableScan};
use super::CarrierParser;
use crate::config::ParseOptions;
use crate::document::{page_lines, pages_text, IllustrationDocument};
use crate::error::Result;
use crate::model::{Carrier, IllustrationRow, IllustrationSummary};

const FALLBACK_TABLE_PAGES: (u32, u32) = (3, 25);
const SUMMARY_PAGES: u32 = 15;
const MIN_TOKENS: usize = 6;
const BOUNDS: RowBounds = RowBounds::new(121, 121);
/// Guaranteed death benefit that shows up in the cash value column when the
/// offsets drift.
const PLACEHOLDER_CASH_VALUE: f64 = 1_000_000.0;
const ALTERNATE_CASH_VALUE: ColumnIndex = ColumnIndex(7);

static ROW_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}\s+\d{2,3}").expect("valid regex"));
static TABULAR_VALUES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)tabular\s+values").expect("valid regex"));
static ILLUSTRATION_SUMMARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)illustration\s+summary").expect("valid regex"));
static YEAR_AGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)year\s+age").expect("valid regex"));

static BASE_PREMIUM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Base Premium\s*\$([0-9,]+(?:\.\d{2})?)").expect("valid regex")
});
static TOTAL_INITIAL_PREMIUM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Total Initial Premium[:\s]*\$([0-9,]+(?:\.\d{2})?)").expect("valid regex")
});
static INITIAL_ANNUALIZED_PREMIUM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Initial Annualized Premium[:\s]*\$([0-9,]+(?:\.\d{2})?)")
        .expect("valid regex")
});
static ALIR_SCHEDULED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"ALIR[^$]*Scheduled[^$]*\$([0-9,]+(?:\.\d{2})?)").expect("valid regex")
});
static ALIR_UNSCHEDULED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"ALIR[^$]*Unscheduled[^$]*\$([0-9,]+(?:\.\d{2})?)").expect("valid regex")
});
static LISR_PREMIUM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"LISR Premium[^$]*\$([0-9,]+(?:\.\d{2})?)").expect("valid regex")
});
static INITIAL_DEATH_BENEFIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Initial Death Benefit[:\s]*\$([0-9,]+(?:\.\d{2})?)").expect("valid regex")
});
static TOTAL_INITIAL_DEATH_BENEFIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Total Initial Death Benefit[:\s]*\$([0-9,]+(?:\.\d{2})?)")
        .expect("valid regex")
});

/// Table variants, told apart by token count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    /// Tabular values with the LISR rider columns (12+ tokens).
    TabularWithRider,
    /// Plain tabular values (8 to 11 tokens).
    Tabular,
    /// Illustration summary table (6 or 7 tokens).
    Summary,
}

impl RowFormat {
    pub fn detect(tokens: usize, tabular_pages: bool) -> Option<Self> {
        let tabular = tabular_pages || tokens >= 10;
        if tabular && tokens >= 12 {
            Some(RowFormat::TabularWithRider)
        } else if tabular && tokens >= 8 {
            Some(RowFormat::Tabular)
        } else if tokens >= MIN_TOKENS {
            Some(RowFormat::Summary)
        } else {
            None
        }
    }

    pub fn columns(self, tokens: usize) -> ColumnMap {
        match self {
            RowFormat::TabularWithRider => ColumnMap::new(0, 1, 5, 8, 11),
            RowFormat::Tabular if tokens >= 10 => ColumnMap::new(0, 1, 2, 7, 9),
            RowFormat::Tabular => ColumnMap::new(0, 1, 2, 7, -1),
            RowFormat::Summary => ColumnMap::new(0, 1, 2, 4, -1),
        }
    }
}

/// Second look at cash value and death benefit when the primary read is
/// implausible. Kept apart from the column read because it can misfire too.
pub fn repair_row(row: &mut IllustrationRow, tokens: &[String]) {
    if let (Some(db), Some(cv)) = (nonzero(row.death_benefit), nonzero(row.cash_value)) {
        if db < cv {
            if let Some(alternate) = ColumnIndex(-1).read(tokens).filter(|alt| *alt > cv) {
                tracing::debug!(year = row.year, from = db, to = alternate, "death benefit below cash value");
                row.death_benefit = Some(alternate);
            }
        }
    }
    if tokens.len() >= 8 && row.cash_value == Some(PLACEHOLDER_CASH_VALUE) {
        if let Some(alternate) = nonzero(ALTERNATE_CASH_VALUE.read(tokens))
            .filter(|alt| *alt != PLACEHOLDER_CASH_VALUE)
        {
            tracing::debug!(year = row.year, to = alternate, "replaced placeholder cash value");
            row.cash_value = Some(alternate);
        }
    }
}

/// MassMutual: table pages are found by their headings; "Tabular Values" pages
/// win over the "Illustration Summary" table.
#[derive(Debug, Clone, Copy, Default)]
pub struct MassMutual;

impl MassMutual {
    /// Table pages and whether they are tabular-values pages.
    async fn locate_table_pages(
        &self,
        doc: &dyn IllustrationDocument,
        opts: &ParseOptions,
    ) -> Result<(Vec<u32>, bool)> {
        let page_count = doc.page_count();
        if opts.has_table_window() {
            let start = opts.table_start().unwrap_or(1);
            let end = opts.table_end().unwrap_or(page_count);
            return Ok((page_window(start, end, page_count).collect(), false));
        }

        let mut tabular = Vec::new();
        let mut summary = Vec::new();
        for page in 1..=page_count {
            let text = page_lines(doc, page).await?.join(" ");
            if TABULAR_VALUES.is_match(&text) {
                tabular.push(page);
            }
            if ILLUSTRATION_SUMMARY.is_match(&text) && YEAR_AGE.is_match(&text) {
                summary.push(page);
            }
        }
        tracing::info!(?tabular, ?summary, "massmutual table pages");

        if !tabular.is_empty() {
            return Ok((tabular, true));
        }
        if !summary.is_empty() {
            return Ok((summary, false));
        }
        let (start, end) = FALLBACK_TABLE_PAGES;
        tracing::info!(start, end, "no table headings found, using common page range");
        Ok((page_window(start, end, page_count).collect(), false))
    }
}

#[async_trait]
impl CarrierParser for MassMutual {
    fn carrier(&self) -> Carrier {
        Carrier::MassMutual
    }

    async fn parse_table(
        &self,
        doc: &dyn IllustrationDocument,
        opts: &ParseOptions,
    ) -> Result<Vec<IllustrationRow>> {
        let (pages, tabular_pages) = self.locate_table_pages(doc, opts).await?;
        let mut scan = TableScan::new();
        for page in pages {
            let lines = page_lines(doc, page).await?;
            for line in &lines {
                let Some(tokens) = row_tokens(&ROW_START, MIN_TOKENS, line) else {
                    continue;
                };
                let Some(format) = RowFormat::detect(tokens.len(), tabular_pages) else {
                    continue;
                };
                let Some(mut row) = format.columns(tokens.len()).read_row(&tokens) else {
                    continue;
                };
                if !BOUNDS.accepts(row.year, row.age) || scan.has_year(row.year) {
                    continue;
                }
                tracing::debug!(year = row.year, ?format, tokens = tokens.len(), "massmutual row");
                repair_row(&mut row, &tokens);
                scan.push(row);
            }
        }
        tracing::info!(rows = scan.len(), "massmutual parsing complete");
        Ok(scan.finish())
    }

    async fn extract_summary(
        &self,
        doc: &dyn IllustrationDocument,
        rows: &[IllustrationRow],
        _opts: &ParseOptions,
    ) -> Result<IllustrationSummary> {
        let mut summary = IllustrationSummary::seeded(Carrier::MassMutual, rows);
        let (text, _) = pages_text(doc, 1..=SUMMARY_PAGES.min(doc.page_count())).await?;

        summary.base_annual_premium = nonzero(capture_amount(&BASE_PREMIUM, &text)).or_else(|| {
            first_capture(&[&*TOTAL_INITIAL_PREMIUM, &*INITIAL_ANNUALIZED_PREMIUM], &text)
        });
        summary.pua_premium = capture_amount(&ALIR_SCHEDULED, &text);
        summary.spua_premium = capture_amount(&ALIR_UNSCHEDULED, &text);
        summary.term_premium = capture_amount(&LISR_PREMIUM, &text);

        if nonzero(summary.initial_death_benefit).is_none() {
            if let Some(db) =
                first_capture(&[&*INITIAL_DEATH_BENEFIT, &*TOTAL_INITIAL_DEATH_BENEFIT], &text)
            {
                summary.initial_death_benefit = Some(db);
            }
        }
        if nonzero(summary.base_annual_premium).is_none() {
            if let Some(premium) = nonzero(rows.first().and_then(|row| row.annual_premium)) {
                summary.base_annual_premium = Some(premium);
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use futures::executor::block_on;

    fn tokens(line: &str) -> Vec<String> {
        crate::tokens::tokenize(line)
    }

    #[test]
    fn formats_follow_token_count() {
        assert_eq!(RowFormat::detect(12, false), Some(RowFormat::TabularWithRider));
        assert_eq!(RowFormat::detect(11, false), Some(RowFormat::Tabular));
        assert_eq!(RowFormat::detect(9, false), Some(RowFormat::Summary));
        assert_eq!(RowFormat::detect(9, true), Some(RowFormat::Tabular));
        assert_eq!(RowFormat::detect(7, true), Some(RowFormat::Summary));
        assert_eq!(RowFormat::detect(5, true), None);
    }

    #[test]
    fn repair_prefers_larger_last_column() {
        let line = "1 45 100 200 300 400 500 90,000.00 50,000.00 1,000,000";
        let toks = tokens(line);
        let mut row = RowFormat::Tabular.columns(toks.len()).read_row(&toks).unwrap();
        row.death_benefit = Some(80_000.0);
        row.cash_value = Some(90_000.0);
        repair_row(&mut row, &toks);
        assert_eq!(row.death_benefit, Some(1_000_000.0));
    }

    #[test]
    fn repair_replaces_placeholder_cash_value() {
        let toks = tokens("1 45 100 200 300 400 500 12,345.00 1,000,000 1,000,000");
        let mut row = IllustrationRow::new(1, 45);
        row.cash_value = Some(1_000_000.0);
        row.death_benefit = Some(1_000_000.0);
        repair_row(&mut row, &toks);
        assert_eq!(row.cash_value, Some(12_345.0));
    }

    #[test]
    fn tabular_pages_win_over_summary_pages() {
        let doc = MemoryDocument::blank(8)
            .with_page_lines(
                3,
                &[
                    "Illustration Summary",
                    "Year Age Outlay Cumulative Cash Value Death Benefit",
                    "1 45 9,000.00 9,000.00 1.00 1,000,000",
                ],
            )
            .with_page_lines(
                6,
                &[
                    "Tabular Values",
                    "1 45 10,000.00 0 1,000,000 150.00 0 7,400.00 0 1,002,000 1,002,000",
                    "2 46 10,000.00 0 1,000,000 300.00 0 16,900.00 0 1,004,000 1,004,000",
                ],
            );
        let rows = block_on(MassMutual.parse_table(&doc, &ParseOptions::default())).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].annual_premium, Some(10_000.0));
        assert_eq!(rows[0].cash_value, Some(7_400.0));
        assert_eq!(rows[0].death_benefit, Some(1_002_000.0));
        assert_eq!(rows[1].cash_value, Some(16_900.0));
    }

    #[test]
    fn summary_table_used_without_tabular_pages() {
        let doc = MemoryDocument::blank(4).with_page_lines(
            2,
            &[
                "Illustration Summary",
                "Year Age Outlay Cumulative Cash Value Death Benefit",
                "1 45 9,000.00 9,000.00 4,100.00 1,000,000",
            ],
        );
        let rows = block_on(MassMutual.parse_table(&doc, &ParseOptions::default())).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cash_value, Some(4_100.0));
        assert_eq!(rows[0].death_benefit, Some(1_000_000.0));
    }

    #[test]
    fn summary_reads_alir_and_lisr() {
        let doc = MemoryDocument::blank(3).with_page_lines(
            1,
            &[
                "Base Premium $9,000.00",
                "ALIR Scheduled Purchase Payment $2,000.00",
                "ALIR Unscheduled First Year Lump Sum $50,000.00",
                "LISR Premium First Year $1,250.00",
                "Initial Death Benefit: $1,500,000",
            ],
        );
        let summary = block_on(MassMutual.extract_summary(&doc, &[], &ParseOptions::default())).unwrap();
        assert_eq!(summary.base_annual_premium, Some(9_000.0));
        assert_eq!(summary.pua_premium, Some(2_000.0));
        assert_eq!(summary.spua_premium, Some(50_000.0));
        assert_eq!(summary.term_premium, Some(1_250.0));
        assert_eq!(summary.initial_death_benefit, Some(1_500_000.0));
    }

    #[test]
    fn base_premium_falls_back_to_total_then_rows() {
        let doc = MemoryDocument::blank(1).with_page_lines(1, &["Total Initial Premium: $12,000"]);
        let summary = block_on(MassMutual.extract_summary(&doc, &[], &ParseOptions::default())).unwrap();
        assert_eq!(summary.base_annual_premium, Some(12_000.0));

        let mut row = IllustrationRow::new(1, 45);
        row.annual_premium = Some(7_500.0);
        let empty = MemoryDocument::blank(1);
        let summary = block_on(MassMutual.extract_summary(&empty, &[row], &ParseOptions::default())).unwrap();
        assert_eq!(summary.base_annual_premium, Some(7_500.0));
    }
}
