//! 金額の解釈と通貨表記

use crate::types::{CellValue, DisplayRow};

/// セル値を金額として解釈する
///
/// `$` `,` 空白を取り除いてから数値化する。空・"nan"・解釈不能・非有限値は 0。
pub fn parse_amount(value: &CellValue) -> f64 {
    match value {
        CellValue::Empty => 0.0,
        CellValue::Number(n) if n.is_finite() => *n,
        CellValue::Number(_) => 0.0,
        CellValue::Text(text) => parse_amount_text(text),
    }
}

fn parse_amount_text(text: &str) -> f64 {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("nan") {
        return 0.0;
    }

    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// "$1234.50" 形式
pub fn format_currency(amount: f64) -> String {
    // -0.0 は "$-0.00" と表示されるので 0 に寄せる
    let amount = if amount.is_finite() { amount + 0.0 } else { 0.0 };
    format!("${:.2}", amount)
}

/// セル値を通貨表記にする（数値でなければ "$0.00"）
pub fn format_cell_currency(value: &CellValue) -> String {
    format_currency(parse_amount(value))
}

/// 表示行の合計
pub fn total_sum(rows: &[DisplayRow]) -> f64 {
    rows.iter().fold(0.0_f64, |acc, r| acc + r.total)
}
