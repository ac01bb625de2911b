//! 請求シートの取得元
//!
//! - SheetsSource: Google Sheets API（HTTPS + Bearerトークン）
//! - WorkbookSource: ローカルにエクスポートしたブック（xlsx/xls/ods）
//!
//! どちらも列名の前後空白を除去した Row を行順で返す。

mod sheets;
mod workbook;

pub use sheets::SheetsSource;
pub use workbook::WorkbookSource;

use crate::error::Result;
use async_trait::async_trait;
use invoice_report_common::Row;

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// 対象タブの全行を取得する
    ///
    /// 取得元に到達できない・タブが存在しない場合は `SourceUnavailable`。
    async fn fetch_all_rows(&self) -> Result<Vec<Row>>;

    /// ログ・エラー表示用の名前
    fn describe(&self) -> String;
}
