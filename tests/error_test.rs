//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use invoice_report::config::Config;
use invoice_report::error::InvoiceError;
use invoice_report::source::{RecordSource, WorkbookSource};
use invoice_report_common::{filter_approved_unpaid, Row};
use tempfile::tempdir;

/// 存在しないブックを読んだ場合
#[tokio::test]
async fn test_missing_workbook_is_source_unavailable() {
    let source = WorkbookSource::new("/nonexistent/path/12345/invoices.xlsx", "Sheet1");
    let err = source.fetch_all_rows().await.unwrap_err();
    assert!(matches!(err, InvoiceError::SourceUnavailable(_)));
}

/// ブックとして読めないファイルの場合
#[tokio::test]
async fn test_unreadable_workbook_is_source_unavailable() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("invoices.xlsx");
    std::fs::write(&path, "this is not a spreadsheet").unwrap();

    let source = WorkbookSource::new(&path, "Estimates/Inovices Status");
    let err = source.fetch_all_rows().await.unwrap_err();
    assert!(matches!(err, InvoiceError::SourceUnavailable(_)));
}

/// ステータス列が無いシートはフィルタエラー
#[test]
fn test_missing_status_column_is_filter_error() {
    let rows = vec![Row::new().with("Name", "frank").with("Approval Status", "approved")];
    let err: InvoiceError = filter_approved_unpaid(&rows).unwrap_err().into();
    assert!(matches!(err, InvoiceError::Filter(_)));
    assert!(err.to_string().contains("Invoice Status"));
}

/// スプレッドシートIDが未設定
#[test]
fn test_sheets_source_requires_spreadsheet_id() {
    let config = Config::default();
    let err = invoice_report::source::SheetsSource::new(&config).err().unwrap();
    assert!(matches!(err, InvoiceError::Config(_)));
}

/// InvoiceErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        InvoiceError::Config("bad config".to_string()),
        InvoiceError::MissingAccessToken,
        InvoiceError::SourceUnavailable("tab 'x' does not exist".to_string()),
        InvoiceError::Filter("column 'Invoice Status' not found in sheet".to_string()),
        InvoiceError::ImageUnavailable {
            id: "abc".to_string(),
            reason: "permission denied (403)".to_string(),
        },
        InvoiceError::ReportGeneration("disk full".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty());
    }

    let err = InvoiceError::ImageUnavailable {
        id: "abc".to_string(),
        reason: "file not found (404)".to_string(),
    };
    assert_eq!(err.to_string(), "image abc unavailable: file not found (404)");
}

/// IOエラーの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err: InvoiceError = io_err.into();
    assert!(matches!(err, InvoiceError::Io(_)));
}
