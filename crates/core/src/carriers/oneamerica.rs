use async_trait::async_trait;

use super::CarrierParser;
use crate::config::ParseOptions;
use crate::document::IllustrationDocument;
use crate::error::Result;
use crate::model::{Carrier, IllustrationRow, IllustrationSummary};

/// One America: no table layout is known yet, so parsing yields no rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneAmerica;

#[async_trait]
impl CarrierParser for OneAmerica {
    fn carrier(&self) -> Carrier {
        Carrier::OneAmerica
    }

    async fn parse_table(
        &self,
        _doc: &dyn IllustrationDocument,
        _opts: &ParseOptions,
    ) -> Result<Vec<IllustrationRow>> {
        tracing::debug!("one america parser not yet configured; returning no rows");
        Ok(Vec::new())
    }

    async fn extract_summary(
        &self,
        _doc: &dyn IllustrationDocument,
        rows: &[IllustrationRow],
        _opts: &ParseOptions,
    ) -> Result<IllustrationSummary> {
        Ok(IllustrationSummary::seeded(Carrier::OneAmerica, rows))
    }
}
