use super::RecordSource;
use crate::error::{InvoiceError, Result};
use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, DataType, Reader};
use invoice_report_common::{rows_from_grid, CellValue, Row};
use std::path::{Path, PathBuf};

/// ローカルのブック（Sheetsからダウンロードしたxlsx等）を読む
pub struct WorkbookSource {
    path: PathBuf,
    sheet_name: String,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>, sheet_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet_name: sheet_name.into(),
        }
    }
}

#[async_trait]
impl RecordSource for WorkbookSource {
    async fn fetch_all_rows(&self) -> Result<Vec<Row>> {
        let path = self.path.clone();
        let sheet_name = self.sheet_name.clone();

        // calamine は同期APIなのでブロッキングスレッドで読む
        tokio::task::spawn_blocking(move || read_sheet(&path, &sheet_name))
            .await
            .map_err(|e| InvoiceError::SourceUnavailable(format!("workbook reader stopped: {}", e)))?
    }

    fn describe(&self) -> String {
        format!("sheet '{}' of {}", self.sheet_name, self.path.display())
    }
}

fn read_sheet(path: &Path, sheet_name: &str) -> Result<Vec<Row>> {
    if !path.exists() {
        return Err(InvoiceError::SourceUnavailable(format!(
            "workbook not found: {}",
            path.display()
        )));
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| {
        InvoiceError::SourceUnavailable(format!("cannot open {}: {}", path.display(), e))
    })?;
    let range = workbook.worksheet_range(sheet_name).map_err(|e| {
        InvoiceError::SourceUnavailable(format!("tab '{}' not found in {}: {}", sheet_name, path.display(), e))
    })?;

    let grid: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(data_to_cell).collect())
        .collect();

    let rows = rows_from_grid(grid);
    tracing::info!("read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(_) => data
            .as_datetime()
            .map(|dt| CellValue::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Empty,
    }
}
