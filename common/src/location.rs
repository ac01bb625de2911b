//! 所在地文字列の整形
//!
//! ワシントンD.C.の住所は「, Washington, District of Columbia 20001」以降を落とし、
//! 番地部分だけを表に載せる。

use regex::Regex;

/// 住所から「, Washington, District of Columbia <ZIP>...」以降を除去する
///
/// 一致しなければ前後の空白を除いた入力をそのまま返す。
pub fn clean_location(location: &str) -> String {
    lazy_static::lazy_static! {
        static ref DC_SUFFIX_RE: Regex =
            Regex::new(r"(?is),\s*Washington,\s*District of Columbia\s*\d{5}.*").unwrap();
    }

    let trimmed = location.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    DC_SUFFIX_RE.replacen(trimmed, 1, "").trim().to_string()
}
