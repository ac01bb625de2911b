//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    /// 必須のステータス列がシートに無い
    #[error("Filter error: {0}")]
    Filter(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
