//! PDF export core utilities.
//!
//! 描画ライブラリに依存しない部分（表の内容・改ページ・ファイル名）をここに置く。

use crate::amount::{format_currency, total_sum};
use crate::layout::{body_height_per_page, body_row_height_mm, wrap_text, BODY_FONT_SIZE, TABLE_COLUMNS};
use crate::types::DisplayRow;
use chrono::NaiveDate;
use std::ops::Range;

/// リンク列の表示
pub const LINK_LABEL: &str = "View Invoice";
pub const NO_LINK_LABEL: &str = "No Link";
pub const TOTAL_LABEL: &str = "TOTAL:";

/// 表の本文1行
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Location, Invoice #, WO #, Total
    pub cells: [String; 4],
    /// 列幅で折り返した各セル
    pub lines: [Vec<String>; 4],
    /// リンク先（空ならNone → "No Link"）
    pub link: Option<String>,
}

impl TableRow {
    pub fn new(cells: [String; 4], link: Option<String>) -> Self {
        let lines = std::array::from_fn(|i| wrap_text(&cells[i], TABLE_COLUMNS[i].width_mm, BODY_FONT_SIZE));
        Self { cells, lines, link }
    }

    pub fn link_label(&self) -> &'static str {
        if self.link.is_some() { LINK_LABEL } else { NO_LINK_LABEL }
    }

    /// 一番多く折り返したセルの行数
    pub fn line_count(&self) -> usize {
        self.lines.iter().map(Vec::len).max().unwrap_or(1)
    }

    pub fn height_mm(&self) -> f32 {
        body_row_height_mm(self.line_count())
    }
}

/// PDFの表（見出し + 本文 + 合計行）
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub header: Vec<&'static str>,
    pub rows: Vec<TableRow>,
    pub total: f64,
}

impl ReportTable {
    pub fn total_text(&self) -> String {
        format_currency(self.total)
    }

    /// ページごとの本文行の範囲
    ///
    /// 行の高さを積み上げて改ページする。本文が空でも1ページ分（空の範囲）を返す。
    /// 合計行は最後のページに置く。
    pub fn pages(&self) -> Vec<Range<usize>> {
        let mut pages = Vec::new();
        let mut start = 0;
        let mut first = true;
        loop {
            let available = body_height_per_page(first);
            let mut used = 0.0;
            let mut end = start;
            while end < self.rows.len() {
                let height = self.rows[end].height_mm();
                // どのページにも最低1行は置く
                if end > start && used + height > available {
                    break;
                }
                used += height;
                end += 1;
            }
            pages.push(start..end);
            if end >= self.rows.len() {
                break;
            }
            start = end;
            first = false;
        }
        pages
    }
}

/// 表示行から表を構築
pub fn build_report_table(rows: &[DisplayRow]) -> ReportTable {
    let table_rows = rows
        .iter()
        .map(|row| {
            let link = row.invoice_link.trim();
            TableRow::new(
                [
                    row.location.clone(),
                    row.invoice_number.clone(),
                    row.work_order_number.clone(),
                    format_currency(row.total),
                ],
                if link.is_empty() { None } else { Some(link.to_string()) },
            )
        })
        .collect();

    ReportTable {
        header: TABLE_COLUMNS.iter().map(|c| c.label).collect(),
        rows: table_rows,
        total: total_sum(rows),
    }
}

/// "frank lopez" → "Frank Lopez"（英字以外の直後を語頭とみなす）
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for c in name.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// ファイル名に使えない文字を置き換える
pub fn sanitize_file_component(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() { "report".to_string() } else { cleaned }
}

/// `<name>_Invoice_<YYYY-MM-DD>.pdf`、2回目以降は `_2`, `_3`...
pub fn report_file_name(subcontractor: &str, date: NaiveDate, attempt: u32) -> String {
    let base = format!(
        "{}_Invoice_{}",
        sanitize_file_component(subcontractor),
        date.format("%Y-%m-%d")
    );
    if attempt <= 1 {
        format!("{}.pdf", base)
    } else {
        format!("{}_{}.pdf", base, attempt)
    }
}
