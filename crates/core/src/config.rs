use serde::{Deserialize, Serialize};

/// User-supplied page windows for a single parse.
///
/// All pages are 1-based. `None` (or 0) leaves the carrier's own default in
/// place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    #[serde(default)]
    pub table_start: Option<u32>,
    #[serde(default)]
    pub table_end: Option<u32>,
    #[serde(default)]
    pub summary_page: Option<u32>,
}

impl ParseOptions {
    pub fn builder() -> ParseOptionsBuilder {
        ParseOptionsBuilder::default()
    }

    pub fn table_start(&self) -> Option<u32> {
        positive(self.table_start)
    }

    pub fn table_end(&self) -> Option<u32> {
        positive(self.table_end)
    }

    pub fn summary_page(&self) -> Option<u32> {
        positive(self.summary_page)
    }

    /// True when either end of the table window was given explicitly.
    pub fn has_table_window(&self) -> bool {
        self.table_start().is_some() || self.table_end().is_some()
    }

    /// Fills unset fields from `defaults`.
    pub fn or(self, defaults: ParseOptions) -> ParseOptions {
        ParseOptions {
            table_start: self.table_start().or(defaults.table_start()),
            table_end: self.table_end().or(defaults.table_end()),
            summary_page: self.summary_page().or(defaults.summary_page()),
        }
    }
}

fn positive(value: Option<u32>) -> Option<u32> {
    value.filter(|page| *page > 0)
}

#[derive(Debug, Clone, Default)]
pub struct ParseOptionsBuilder {
    options: ParseOptions,
}

impl ParseOptionsBuilder {
    pub fn table_start(mut self, page: Option<u32>) -> Self {
        self.options.table_start = page;
        self
    }

    pub fn table_end(mut self, page: Option<u32>) -> Self {
        self.options.table_end = page;
        self
    }

    pub fn table_window(self, start: u32, end: u32) -> Self {
        self.table_start(Some(start)).table_end(Some(end))
    }

    pub fn summary_page(mut self, page: Option<u32>) -> Self {
        self.options.summary_page = page;
        self
    }

    pub fn build(self) -> ParseOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_pages_mean_default() {
        let opts = ParseOptions::builder()
            .table_start(Some(0))
            .summary_page(Some(16))
            .build();
        assert_eq!(opts.table_start(), None);
        assert_eq!(opts.summary_page(), Some(16));
        assert!(!opts.has_table_window());
    }

    #[test]
    fn explicit_values_win_over_defaults() {
        let cli = ParseOptions::builder().table_window(11, 19).build();
        let file = ParseOptions::builder()
            .table_window(10, 20)
            .summary_page(Some(15))
            .build();
        let merged = cli.or(file);
        assert_eq!(merged.table_start(), Some(11));
        assert_eq!(merged.table_end(), Some(19));
        assert_eq!(merged.summary_page(), Some(15));
    }
}
