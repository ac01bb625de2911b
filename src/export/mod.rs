pub mod pdf;

use crate::error::{InvoiceError, Result};
use crate::images::ReportImage;
use chrono::{Local, NaiveDate, NaiveDateTime};
use invoice_report_common::{build_report_table, report_file_name, DisplayRow};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// 同日の連番の上限
const MAX_SAME_DAY_REPORTS: u32 = 999;

/// 生成したレポートの情報
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutput {
    pub path: PathBuf,
    pub table_rows: usize,
    pub image_pages: usize,
    pub total: f64,
}

/// 請求表と画像からPDFを生成し、出力ディレクトリに保存する
pub fn build_report(
    rows: &[DisplayRow],
    images: &[Option<ReportImage>],
    subcontractor: &str,
    output_dir: &Path,
) -> Result<ReportOutput> {
    build_report_at(rows, images, subcontractor, output_dir, Local::now().naive_local())
}

/// 生成日時を指定して生成（ファイル名の日付もこれに従う）
pub fn build_report_at(
    rows: &[DisplayRow],
    images: &[Option<ReportImage>],
    subcontractor: &str,
    output_dir: &Path,
    generated: NaiveDateTime,
) -> Result<ReportOutput> {
    let table = build_report_table(rows);
    let rendered = pdf::render_report(&table, images, subcontractor, generated)?;

    let path = write_report_file(&rendered.bytes, output_dir, subcontractor, generated.date())?;
    tracing::info!("wrote {}", path.display());

    Ok(ReportOutput {
        path,
        table_rows: table.rows.len(),
        image_pages: rendered.image_pages,
        total: table.total,
    })
}

/// 一時ファイルに書いてから既存ファイルを上書きせずにリネームする
///
/// 同名のファイルがあれば `_2`, `_3`... を付ける。失敗時に途中のファイルは残らない。
fn write_report_file(bytes: &[u8], output_dir: &Path, subcontractor: &str, date: NaiveDate) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir).map_err(|e| {
        InvoiceError::ReportGeneration(format!("cannot create {}: {}", output_dir.display(), e))
    })?;

    let mut temp = NamedTempFile::new_in(output_dir)
        .map_err(|e| InvoiceError::ReportGeneration(format!("temp file: {}", e)))?;
    temp.write_all(bytes)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| InvoiceError::ReportGeneration(format!("write: {}", e)))?;

    let mut attempt = 1;
    loop {
        let path = output_dir.join(report_file_name(subcontractor, date, attempt));
        match temp.persist_noclobber(&path) {
            Ok(_) => return Ok(path),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists && attempt < MAX_SAME_DAY_REPORTS => {
                tracing::debug!("{} exists, trying next suffix", path.display());
                temp = e.file;
                attempt += 1;
            }
            Err(e) => {
                return Err(InvoiceError::ReportGeneration(format!(
                    "cannot save {}: {}",
                    path.display(),
                    e.error
                )))
            }
        }
    }
}
