//! ファイル参照文字列からファイルIDを取り出す
//!
//! 対応する形式:
//! - `https://drive.google.com/open?id=<ID>`
//! - `https://drive.google.com/file/d/<ID>/view`
//!
//! 先頭の `@` は除去する（フォームからの貼り付けで混入する）。

use regex::Regex;

pub fn extract_reference_id(url: &str) -> Option<String> {
    lazy_static::lazy_static! {
        static ref QUERY_ID_RE: Regex = Regex::new(r"[?&]id=([A-Za-z0-9_-]+)").unwrap();
        static ref PATH_ID_RE: Regex = Regex::new(r"/d/([A-Za-z0-9_-]+)").unwrap();
    }

    let url = url.trim();
    let url = url.strip_prefix('@').unwrap_or(url);
    if url.is_empty() {
        return None;
    }

    QUERY_ID_RE
        .captures(url)
        .or_else(|| PATH_ID_RE.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
