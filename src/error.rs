use thiserror::Error;

#[derive(Error, Debug)]
pub enum InvoiceError {
    #[error("config error: {0}")]
    Config(String),

    #[error("no access token configured; set GOOGLE_ACCESS_TOKEN or `invoice-report config --set-access-token`")]
    MissingAccessToken,

    #[error("spreadsheet unavailable: {0}")]
    SourceUnavailable(String),

    #[error("filter error: {0}")]
    Filter(String),

    #[error("image {id} unavailable: {reason}")]
    ImageUnavailable { id: String, reason: String },

    #[error("failed to generate report: {0}")]
    ReportGeneration(String),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<invoice_report_common::Error> for InvoiceError {
    fn from(err: invoice_report_common::Error) -> Self {
        match err {
            invoice_report_common::Error::Filter(msg) => InvoiceError::Filter(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, InvoiceError>;
