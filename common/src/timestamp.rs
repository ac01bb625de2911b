//! 請求タイムスタンプの解釈
//!
//! フォーム連携のシートは `%m/%d/%Y %H:%M:%S` が多いが、手入力の行もあるため
//! いくつかの形式を順に試す。どれにも当たらなければ None（並び順では末尾）。

use crate::types::CellValue;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d"];

pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// スプレッドシートのシリアル値（1899-12-30 起点の日数、小数部は時刻）
pub fn timestamp_from_serial(serial: f64) -> Option<NaiveDateTime> {
    // 1900-01-01 より前や9999年より後は日付として扱わない
    if !serial.is_finite() || !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

/// セル値から時刻を得る（数値はシリアル値、文字列は書式を順に試す）
pub fn cell_timestamp(value: &CellValue) -> Option<NaiveDateTime> {
    match value {
        CellValue::Number(n) => timestamp_from_serial(*n),
        CellValue::Text(text) => parse_timestamp(text),
        CellValue::Empty => None,
    }
}
