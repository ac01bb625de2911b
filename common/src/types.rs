//! 請求データの型定義
//!
//! - CellValue: スプレッドシートの1セル
//! - Row: 1行（列名 → 値、列順を保持）
//! - DisplayRow: 表示・PDF出力用の射影

use serde::{Deserialize, Serialize};
use std::fmt;

/// 正規化後の列名
pub mod columns {
    pub const NAME: &str = "Name";
    pub const APPROVAL_STATUS: &str = "Approval Status";
    pub const INVOICE_STATUS: &str = "Invoice Status";
    pub const INVOICE_TIMESTAMP: &str = "Invoice Timestamp";
    pub const LOCATION: &str = "Location";
    pub const INVOICE_NUMBER: &str = "Invoice #";
    pub const WORK_ORDER_NUMBER: &str = "WO #";
    pub const TOTAL: &str = "Total";
    pub const INVOICE_LINK: &str = "Invoice Link";
}

/// セル値
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    /// 空文字・空白のみのテキストも空として扱う
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            // 整数値は小数点なしで表示（"1042" であって "1042.0" ではない）
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// スプレッドシートの1行
///
/// 列順を保持する。フィルタは新しい Row を作り、元の Row は変更しない。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// 列を追加したRowを返す（同名列は上書き）
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.set(column.into(), value.into());
        self
    }

    fn set(&mut self, column: String, value: CellValue) {
        if let Some(slot) = self.cells.iter_mut().find(|(name, _)| *name == column) {
            slot.1 = value;
        } else {
            self.cells.push((column, value));
        }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// 値を文字列で取得（列がなければ空文字）
    pub fn text(&self, column: &str) -> String {
        self.get(column).map(CellValue::as_text).unwrap_or_default()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.cells.iter().any(|(name, _)| name == column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn cells(&self) -> &[(String, CellValue)] {
        &self.cells
    }

    /// 指定列の値を差し替えた新しいRowを返す
    pub fn replaced(&self, column: &str, value: CellValue) -> Row {
        let mut row = self.clone();
        row.set(column.to_string(), value);
        row
    }

    /// 列名を変更した新しいRowを返す
    pub(crate) fn renamed(&self, from: &str, to: &str) -> Row {
        let cells = self
            .cells
            .iter()
            .map(|(name, value)| {
                if name == from {
                    (to.to_string(), value.clone())
                } else {
                    (name.clone(), value.clone())
                }
            })
            .collect();
        Row { cells }
    }
}

impl FromIterator<(String, CellValue)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, CellValue)>>(iter: T) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.set(column, value);
        }
        row
    }
}

/// 表示用の行
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRow {
    pub location: String,
    pub invoice_number: String,
    pub work_order_number: String,
    pub total: f64,
    pub invoice_link: String,
}

/// 2次元グリッド（先頭行がヘッダー）からRowを構築
///
/// ヘッダー名は前後の空白を除去する。短い行は Empty で埋める。
pub fn rows_from_grid(grid: Vec<Vec<CellValue>>) -> Vec<Row> {
    let mut iter = grid.into_iter();
    let Some(header) = iter.next() else {
        return Vec::new();
    };

    let headers: Vec<Option<String>> = header
        .iter()
        .map(|cell| {
            let name = cell.as_text().trim().to_string();
            if name.is_empty() { None } else { Some(name) }
        })
        .collect();

    iter.map(|values| {
        let mut values = values.into_iter();
        headers
            .iter()
            .map(|name| (name, values.next().unwrap_or_default()))
            .filter_map(|(name, value)| name.as_ref().map(|n| (n.clone(), value)))
            .collect()
    })
    .collect()
}
