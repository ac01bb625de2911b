//! invoice-report
//!
//! 請求シートの取得、承認済み・未払いの抽出、画像の解決、PDF生成。

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod images;
pub mod pipeline;
pub mod source;
pub mod worker;

pub use config::Config;
pub use error::{InvoiceError, Result};
pub use pipeline::{InvoiceSession, RefreshSummary, Selection};
