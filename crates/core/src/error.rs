use thiserror::Error;

use crate::model::Carrier;

#[derive(Error, Debug)]
pub enum IllustraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("pdf error: {0}")]
    Pdf(String),
    #[error("pdf support not enabled")]
    PdfSupportDisabled,
    #[error("page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("unknown carrier: {0}")]
    UnknownCarrier(String),
    #[error("carrier {0} has no table parser")]
    UnsupportedCarrier(Carrier),
    #[error("invalid option slot: {0}")]
    InvalidSlot(usize),
    #[error("option slot {0} is empty")]
    EmptySlot(usize),
    #[error("csv format not recognized: {0}")]
    CsvShape(&'static str),
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("other: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, IllustraError>;

impl From<anyhow::Error> for IllustraError {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(value.to_string())
    }
}
