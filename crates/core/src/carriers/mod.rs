//! Per-carrier table parsers and summary extractors.
//!
//! Each carrier is a unit struct implementing [`CarrierParser`]; their row
//! layouts and summary patterns live in statics next to them so adding a
//! carrier never touches the others.

use async_trait::async_trait;

use crate::config::ParseOptions;
use crate::document::IllustrationDocument;
use crate::error::Result;
use crate::model::{Carrier, IllustrationRow, IllustrationSummary};

mod ameritas;
mod guardian;
mod lafayette;
mod massmutual;
mod oneamerica;
pub mod summary;
pub mod table;

pub use ameritas::Ameritas;
pub use guardian::Guardian;
pub use lafayette::Lafayette;
pub use massmutual::MassMutual;
pub use oneamerica::OneAmerica;

#[async_trait]
pub trait CarrierParser: Send + Sync {
    fn carrier(&self) -> Carrier;

    /// Rows found in the document, sorted by year, one per year.
    async fn parse_table(
        &self,
        doc: &dyn IllustrationDocument,
        opts: &ParseOptions,
    ) -> Result<Vec<IllustrationRow>>;

    /// Headline figures. Fields that cannot be found stay `None`.
    async fn extract_summary(
        &self,
        doc: &dyn IllustrationDocument,
        rows: &[IllustrationRow],
        opts: &ParseOptions,
    ) -> Result<IllustrationSummary>;
}

/// Parser registered for `carrier`; CSV imports have none.
pub fn parser_for(carrier: Carrier) -> Option<&'static dyn CarrierParser> {
    match carrier {
        Carrier::Lafayette => Some(&Lafayette),
        Carrier::MassMutual => Some(&MassMutual),
        Carrier::Ameritas => Some(&Ameritas),
        Carrier::Guardian => Some(&Guardian),
        Carrier::OneAmerica => Some(&OneAmerica),
        Carrier::Csv => None,
    }
}
