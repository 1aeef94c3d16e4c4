pub mod carriers;
mod config;
mod csv_import;
mod document;
mod error;
mod ingest;
mod layout;
mod metrics;
mod model;
mod normalization;
mod overrides;
mod pdf;
mod session;
mod tokens;

pub use carriers::{parser_for, CarrierParser};
pub use config::{ParseOptions, ParseOptionsBuilder};
pub use csv_import::{import_csv, ImportedOption};
pub use document::{pages_text, page_lines, IllustrationDocument, MemoryDocument, TextFragment};
pub use error::{IllustraError, Result};
pub use ingest::{parse_illustration, parse_with, ParsedIllustration};
pub use layout::reconstruct_lines;
pub use metrics::{
    cash_value_efficiency, cash_value_increase, irr, solve_irr, surrender_cash_flows, Metric,
};
pub use model::{
    Carrier, IllustrationOption, IllustrationRow, IllustrationSummary, OptionSource, RowField,
    SourceKind, SummaryField, SLOT_COUNT,
};
pub use normalization::{normalize_rows, MAX_DISPLAY_AGE};
pub use overrides::{OverrideKey, OverrideMap};
pub use pdf::PdfIllustration;
pub use session::{ComparisonSession, ComparisonSnapshot, Toggles};
pub use tokens::{extract_amounts, parse_number, tokenize};
