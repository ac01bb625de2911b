//! 請求行のフィルタ処理
//!
//! 2段階のフィルタ:
//! 1. 承認済み かつ 未払い（全体）
//! 2. 下請業者名の部分一致（選択時）
//!
//! どちらも入力を変更せず、新しい行集合を返す。

use crate::amount::{parse_amount, total_sum};
use crate::error::{Error, Result};
use crate::location::clean_location;
use crate::timestamp::cell_timestamp;
use crate::types::{columns, CellValue, DisplayRow, Row};
use serde::Serialize;

/// 承認済みとみなす値（小文字・trim済みで比較）
pub const APPROVED_VALUES: &[&str] = &["approved", "aprobado"];

/// 未払いとみなす請求ステータス（trim済みで比較）
pub const UNPAID_MARKERS: &[&str] = &["", "nan", "None"];

fn is_approved(status: &str) -> bool {
    APPROVED_VALUES.contains(&status)
}

fn is_unpaid(status: &str) -> bool {
    UNPAID_MARKERS.contains(&status)
}

/// 承認済み・未払いの行だけを残す
///
/// - `Approval Status` と `Name` は小文字・trim、`Invoice Status` は trim して新しい行に格納
/// - `Invoice Timestamp` 列があれば昇順に並べる（解釈できない値は末尾、同値は元の順）
/// - ステータス列がどの行にも存在しない場合は `Error::Filter`
pub fn filter_approved_unpaid(rows: &[Row]) -> Result<Vec<Row>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    for column in [columns::APPROVAL_STATUS, columns::INVOICE_STATUS] {
        if !rows.iter().any(|row| row.has_column(column)) {
            return Err(Error::Filter(format!("column '{}' not found in sheet", column)));
        }
    }

    let mut kept: Vec<Row> = rows
        .iter()
        .filter_map(|row| {
            let approval = row.text(columns::APPROVAL_STATUS).trim().to_lowercase();
            let invoice_status = row.text(columns::INVOICE_STATUS).trim().to_string();

            if !is_approved(&approval) || !is_unpaid(&invoice_status) {
                return None;
            }

            let name = row.text(columns::NAME).trim().to_lowercase();
            let mut normalized = row
                .replaced(columns::APPROVAL_STATUS, CellValue::Text(approval))
                .replaced(columns::INVOICE_STATUS, CellValue::Text(invoice_status));
            if row.has_column(columns::NAME) {
                normalized = normalized.replaced(columns::NAME, CellValue::Text(name));
            }
            Some(normalized)
        })
        .collect();

    if kept.iter().any(|row| row.has_column(columns::INVOICE_TIMESTAMP)) {
        // sort_by_key は安定ソート。None（解釈不能）は末尾へ
        kept.sort_by_key(|row| {
            let ts = row.get(columns::INVOICE_TIMESTAMP).and_then(cell_timestamp);
            (ts.is_none(), ts)
        });
    }

    Ok(kept)
}

/// 下請業者名（部分一致・大文字小文字無視）で絞り込む
///
/// `Name` が無い行は除外する。
pub fn filter_by_subcontractor(rows: &[Row], name: &str) -> Vec<Row> {
    let needle = name.trim().to_lowercase();
    rows.iter()
        .filter(|row| match row.get(columns::NAME) {
            Some(value) if !value.is_blank() => value.as_text().to_lowercase().contains(&needle),
            _ => false,
        })
        .cloned()
        .collect()
}

/// 表示用の行へ射影する
pub fn prepare_display(rows: &[Row]) -> Vec<DisplayRow> {
    rows.iter()
        .map(|row| DisplayRow {
            location: clean_location(&row.text(columns::LOCATION)),
            invoice_number: row.text(columns::INVOICE_NUMBER).trim().to_string(),
            work_order_number: row.text(columns::WORK_ORDER_NUMBER).trim().to_string(),
            total: row.get(columns::TOTAL).map(parse_amount).unwrap_or(0.0),
            invoice_link: row.text(columns::INVOICE_LINK).trim().to_string(),
        })
        .collect()
}

/// 画像参照（空でない `Invoice Link`）を行順に取り出す
pub fn image_references(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .map(|row| row.text(columns::INVOICE_LINK).trim().to_string())
        .filter(|link| !link.is_empty())
        .collect()
}

/// 下請業者ごとの未払い集計
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubcontractorSummary {
    pub name: String,
    pub items: usize,
    pub amount: f64,
}

/// 名簿の各業者について件数と金額を集計する
pub fn subcontractor_summary(rows: &[Row], roster: &[String]) -> Vec<SubcontractorSummary> {
    roster
        .iter()
        .map(|name| {
            let matched = filter_by_subcontractor(rows, name);
            let display = prepare_display(&matched);
            SubcontractorSummary {
                name: name.clone(),
                items: display.len(),
                amount: total_sum(&display),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, approval: &str, status: Option<&str>) -> Row {
        let row = Row::new()
            .with("Name", name)
            .with("Approval Status", approval);
        match status {
            Some(s) => row.with("Invoice Status", s),
            None => row.with("Invoice Status", CellValue::Empty),
        }
    }

    #[test]
    fn test_keeps_approved_unpaid() {
        let rows = vec![
            row("Frank", " Approved ", Some("")),
            row("Htin", "APROBADO", Some("nan")),
            row("Marco", "approved", Some("None")),
            row("Edgar", "approved", Some("   ")),
            row("Nahun", "approved", None),
            row("Harold", "approved", Some("Paid")),
            row("Pelico", "pending", Some("")),
        ];

        let kept = filter_approved_unpaid(&rows).unwrap();
        let names: Vec<String> = kept.iter().map(|r| r.text("Name")).collect();
        assert_eq!(names, vec!["frank", "htin", "marco", "edgar", "nahun"]);
    }

    #[test]
    fn test_normalizes_values() {
        let rows = vec![row("  Josue Cruz ", " Approved", Some("  "))];
        let kept = filter_approved_unpaid(&rows).unwrap();
        assert_eq!(kept[0].text("Name"), "josue cruz");
        assert_eq!(kept[0].text("Approval Status"), "approved");
        assert_eq!(kept[0].text("Invoice Status"), "");
        // 元の行は変わらない
        assert_eq!(rows[0].text("Name"), "  Josue Cruz ");
    }

    #[test]
    fn test_none_literal_is_case_sensitive() {
        // "None" だけが未払い扱い。"none" は請求済みの値として扱う
        let rows = vec![row("frank", "approved", Some("none"))];
        assert!(filter_approved_unpaid(&rows).unwrap().is_empty());
    }

    #[test]
    fn test_missing_status_column() {
        let rows = vec![Row::new().with("Name", "frank").with("Approval Status", "approved")];
        let err = filter_approved_unpaid(&rows).unwrap_err();
        assert!(matches!(err, Error::Filter(_)));
        assert!(err.to_string().contains("Invoice Status"));
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_approved_unpaid(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_sorted_by_timestamp_unknown_last() {
        let rows = vec![
            row("a", "approved", Some("")).with("Invoice Timestamp", "3/2/2024 10:00:00"),
            row("b", "approved", Some("")).with("Invoice Timestamp", "garbage"),
            row("c", "approved", Some("")).with("Invoice Timestamp", "3/1/2024 10:00:00"),
            row("d", "approved", Some("")).with("Invoice Timestamp", ""),
        ];
        let kept = filter_approved_unpaid(&rows).unwrap();
        let names: Vec<String> = kept.iter().map(|r| r.text("Name")).collect();
        assert_eq!(names, vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_serial_timestamps_sort_with_text_ones() {
        let rows = vec![
            row("text", "approved", Some("")).with("Invoice Timestamp", "3/14/2024 10:00:00"),
            row("serial", "approved", Some("")).with("Invoice Timestamp", CellValue::Number(45352.5)),
            row("unknown", "approved", Some("")).with("Invoice Timestamp", "garbage"),
        ];
        let kept = filter_approved_unpaid(&rows).unwrap();
        let names: Vec<String> = kept.iter().map(|r| r.text("Name")).collect();
        // 45352.5 = 2024-03-01 12:00
        assert_eq!(names, vec!["serial", "text", "unknown"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let rows = vec![
            row("first", "approved", Some("")).with("Invoice Timestamp", "2024-01-01 08:00:00"),
            row("second", "approved", Some("")).with("Invoice Timestamp", "2024-01-01 08:00:00"),
        ];
        let kept = filter_approved_unpaid(&rows).unwrap();
        assert_eq!(kept[0].text("Name"), "first");
        assert_eq!(kept[1].text("Name"), "second");
    }

    #[test]
    fn test_subcontractor_substring() {
        let rows = vec![
            Row::new().with("Name", "frank lopez"),
            Row::new().with("Name", "franklin"),
            Row::new().with("Name", "harold"),
            Row::new().with("Location", "no name"),
        ];
        let lower = filter_by_subcontractor(&rows, "frank");
        let upper = filter_by_subcontractor(&rows, "FRANK");
        assert_eq!(lower.len(), 2);
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_prepare_display() {
        let rows = vec![Row::new()
            .with("Location", "123 Main St, Washington, District of Columbia 20001")
            .with("Invoice #", CellValue::Number(1042.0))
            .with("WO #", "WO-77")
            .with("Total", "$1,200.50")
            .with("Invoice Link", "https://host/open?id=abc")
            .with("Notes", "ignored")];

        let display = prepare_display(&rows);
        assert_eq!(
            display[0],
            DisplayRow {
                location: "123 Main St".to_string(),
                invoice_number: "1042".to_string(),
                work_order_number: "WO-77".to_string(),
                total: 1200.5,
                invoice_link: "https://host/open?id=abc".to_string(),
            }
        );
    }

    #[test]
    fn test_prepare_display_bad_total() {
        let rows = vec![Row::new().with("Total", "TBD")];
        assert_eq!(prepare_display(&rows)[0].total, 0.0);
        assert!(prepare_display(&[]).is_empty());
    }

    #[test]
    fn test_image_references_skip_blank() {
        let rows = vec![
            Row::new().with("Invoice Link", "https://a"),
            Row::new().with("Invoice Link", " "),
            Row::new(),
            Row::new().with("Invoice Link", "https://b"),
        ];
        assert_eq!(image_references(&rows), vec!["https://a", "https://b"]);
    }

    #[test]
    fn test_subcontractor_summary() {
        let rows = vec![
            Row::new().with("Name", "frank").with("Total", "100"),
            Row::new().with("Name", "frank").with("Total", "50.5"),
            Row::new().with("Name", "htin").with("Total", "20"),
        ];
        let roster = vec!["frank".to_string(), "marco".to_string()];
        let summary = subcontractor_summary(&rows, &roster);
        assert_eq!(summary[0].items, 2);
        assert_eq!(summary[0].amount, 150.5);
        assert_eq!(summary[1].items, 0);
    }
}
