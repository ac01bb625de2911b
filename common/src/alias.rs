//! 列名エイリアス
//!
//! シートごとの列名の表記ゆれを正規の列名へ寄せる。
//! 取得のたびに1回だけ解決し、以降の処理は正規名だけを参照する。

use crate::types::{columns, Row};
use serde::{Deserialize, Serialize};

/// 正規列名 → 受け付ける列名（優先順）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnAliases {
    pub name: Vec<String>,
    pub approval_status: Vec<String>,
    pub invoice_status: Vec<String>,
    pub invoice_timestamp: Vec<String>,
    pub location: Vec<String>,
    pub invoice_number: Vec<String>,
    pub work_order_number: Vec<String>,
    pub total: Vec<String>,
    pub invoice_link: Vec<String>,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        fn list(names: &[&str]) -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        }

        Self {
            name: list(&[columns::NAME]),
            approval_status: list(&[columns::APPROVAL_STATUS]),
            invoice_status: list(&[columns::INVOICE_STATUS]),
            invoice_timestamp: list(&[columns::INVOICE_TIMESTAMP]),
            location: list(&[columns::LOCATION]),
            invoice_number: list(&[columns::INVOICE_NUMBER]),
            work_order_number: list(&[columns::WORK_ORDER_NUMBER]),
            total: list(&[columns::TOTAL]),
            invoice_link: list(&[columns::INVOICE_LINK, "invoice link", "Picture of Completed Job"]),
        }
    }
}

/// 解決済みの対応表（実列名 → 正規列名）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedColumns {
    renames: Vec<(String, &'static str)>,
    missing: Vec<&'static str>,
}

impl ResolvedColumns {
    /// 正規名に対応する実列名
    pub fn source_of(&self, canonical: &str) -> Option<&str> {
        self.renames
            .iter()
            .find(|(_, c)| *c == canonical)
            .map(|(source, _)| source.as_str())
    }

    /// どのエイリアスも見つからなかった正規名
    pub fn missing(&self) -> &[&'static str] {
        &self.missing
    }
}

impl ColumnAliases {
    fn entries(&self) -> [(&'static str, &[String]); 9] {
        [
            (columns::NAME, self.name.as_slice()),
            (columns::APPROVAL_STATUS, self.approval_status.as_slice()),
            (columns::INVOICE_STATUS, self.invoice_status.as_slice()),
            (columns::INVOICE_TIMESTAMP, self.invoice_timestamp.as_slice()),
            (columns::LOCATION, self.location.as_slice()),
            (columns::INVOICE_NUMBER, self.invoice_number.as_slice()),
            (columns::WORK_ORDER_NUMBER, self.work_order_number.as_slice()),
            (columns::TOTAL, self.total.as_slice()),
            (columns::INVOICE_LINK, self.invoice_link.as_slice()),
        ]
    }

    /// 行の列名集合に対してエイリアスを解決
    pub fn resolve(&self, rows: &[Row]) -> ResolvedColumns {
        let mut headers: Vec<&str> = Vec::new();
        for row in rows {
            for column in row.columns() {
                if !headers.contains(&column) {
                    headers.push(column);
                }
            }
        }

        let mut resolved = ResolvedColumns::default();
        for (canonical, aliases) in self.entries() {
            // 先に一致したエイリアスを採用
            match aliases.iter().find(|alias| headers.contains(&alias.as_str())) {
                Some(source) => resolved.renames.push((source.clone(), canonical)),
                None => resolved.missing.push(canonical),
            }
        }
        resolved
    }

    /// 列名を正規名へ変換した新しい行集合を返す
    pub fn canonicalize(&self, rows: &[Row]) -> (Vec<Row>, ResolvedColumns) {
        let resolved = self.resolve(rows);
        let canonical_rows = rows
            .iter()
            .map(|row| {
                resolved
                    .renames
                    .iter()
                    .filter(|(source, canonical)| source.as_str() != *canonical)
                    .fold(row.clone(), |acc, (source, canonical)| acc.renamed(source, canonical))
            })
            .collect();
        (canonical_rows, resolved)
    }

    /// 設定をマージ（後から追加したエイリアスは既存の後ろに並ぶ）
    pub fn merge(&mut self, other: &ColumnAliases) {
        fn extend(target: &mut Vec<String>, extra: &[String]) {
            for alias in extra {
                if !target.contains(alias) {
                    target.push(alias.clone());
                }
            }
        }

        extend(&mut self.name, &other.name);
        extend(&mut self.approval_status, &other.approval_status);
        extend(&mut self.invoice_status, &other.invoice_status);
        extend(&mut self.invoice_timestamp, &other.invoice_timestamp);
        extend(&mut self.location, &other.location);
        extend(&mut self.invoice_number, &other.invoice_number);
        extend(&mut self.work_order_number, &other.work_order_number);
        extend(&mut self.total, &other.total);
        extend(&mut self.invoice_link, &other.invoice_link);
    }
}
