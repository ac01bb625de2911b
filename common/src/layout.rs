//! レイアウト設定モジュール
//!
//! mm基準のレイアウト定義。PDF描画は pt に変換して使う。

// ============================================
// ページ（US Letter）
// ============================================

/// Letterサイズ（mm）
pub const LETTER_WIDTH_MM: f32 = 215.9;
pub const LETTER_HEIGHT_MM: f32 = 279.4;

/// 余白（mm）
pub const MARGIN_MM: f32 = 15.0;

/// 利用可能幅（mm）
pub const USABLE_WIDTH_MM: f32 = LETTER_WIDTH_MM - MARGIN_MM * 2.0; // 185.9mm

// ============================================
// 画像
// ============================================

/// 画像ページの最大印刷領域（7in × 9in）
pub const IMAGE_MAX_WIDTH_MM: f32 = 7.0 * 25.4;
pub const IMAGE_MAX_HEIGHT_MM: f32 = 9.0 * 25.4;

/// 最適化後の画像の最大ピクセル数（レポートのサイズとメモリを抑える）
pub const IMAGE_MAX_WIDTH_PX: u32 = 600;
pub const IMAGE_MAX_HEIGHT_PX: u32 = 800;

// ============================================
// 表
// ============================================

/// 表の列定義
#[derive(Debug, Clone, Copy)]
pub struct ColumnDefinition {
    pub label: &'static str,
    pub width_mm: f32,
}

/// 表の列（Location, Invoice #, WO #, Total, Invoice Link）
pub const TABLE_COLUMNS: &[ColumnDefinition] = &[
    ColumnDefinition { label: "Location", width_mm: 70.0 },
    ColumnDefinition { label: "Invoice #", width_mm: 28.0 },
    ColumnDefinition { label: "WO #", width_mm: 28.0 },
    ColumnDefinition { label: "Total", width_mm: 28.0 },
    ColumnDefinition { label: "Invoice Link", width_mm: 31.0 },
];

pub const TOTAL_COLUMN: usize = 3;
pub const LINK_COLUMN: usize = 4;

pub const TITLE_FONT_SIZE: f32 = 18.0;
pub const HEADER_FONT_SIZE: f32 = 11.0;
pub const BODY_FONT_SIZE: f32 = 9.0;

pub const HEADER_ROW_HEIGHT_MM: f32 = 9.0;
/// 1行だけの本文行の高さ
pub const BODY_ROW_HEIGHT_MM: f32 = 7.0;
/// 折り返した本文の行送り
pub const BODY_LINE_HEIGHT_MM: f32 = 4.0;
pub const CELL_PADDING_MM: f32 = 1.5;

/// タイトル・生成日時の領域（1ページ目のみ）
pub const TITLE_BLOCK_HEIGHT_MM: f32 = 24.0;

/// 表の総幅（mm）
pub fn table_width_mm() -> f32 {
    TABLE_COLUMNS.iter().map(|c| c.width_mm).sum()
}

/// 列の左端X座標（mm、左余白から）
pub fn column_x_mm(index: usize) -> f32 {
    MARGIN_MM + TABLE_COLUMNS[..index].iter().map(|c| c.width_mm).sum::<f32>()
}

/// 1ページで本文行に使える高さ（mm）
///
/// 見出し行の分と、最終ページで合計行を置く1行分を差し引く。
pub fn body_height_per_page(first_page: bool) -> f32 {
    let available = LETTER_HEIGHT_MM - MARGIN_MM * 2.0 - HEADER_ROW_HEIGHT_MM - BODY_ROW_HEIGHT_MM;
    if first_page {
        available - TITLE_BLOCK_HEIGHT_MM
    } else {
        available
    }
}

/// `lines` 行に折り返した本文行の高さ
pub fn body_row_height_mm(lines: usize) -> f32 {
    BODY_ROW_HEIGHT_MM + lines.saturating_sub(1) as f32 * BODY_LINE_HEIGHT_MM
}

// ============================================
// 変換・計算
// ============================================

/// mm → pt変換 (1mm = 72/25.4 pt ≈ 2.835pt)
pub const MM_TO_PT: f32 = 72.0 / 25.4;

/// mm → pt 変換
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * MM_TO_PT
}

/// pt → mm 変換
#[inline]
pub fn pt_to_mm(pt: f32) -> f32 {
    pt / MM_TO_PT
}

/// 縦横比を保って (max_w, max_h) に収める。拡大はしない
pub fn fit_within(width: f32, height: f32, max_width: f32, max_height: f32) -> (f32, f32) {
    if width <= 0.0 || height <= 0.0 {
        return (0.0, 0.0);
    }
    let scale = (max_width / width).min(max_height / height).min(1.0);
    (width * scale, height * scale)
}

/// ピクセル寸法を上限内に収める（拡大しない）
pub fn fit_pixels(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let (w, h) = fit_within(width as f32, height as f32, max_width as f32, max_height as f32);
    ((w.round() as u32).max(1), (h.round() as u32).max(1))
}

/// Helvetica の文字幅（1000単位）の近似値
fn helvetica_advance(c: char) -> f32 {
    match c {
        '0'..='9' | '$' | '#' | '?' | '_' => 556.0,
        '.' | ',' | ':' | ';' | ' ' | '!' | '/' | 'i' | 'j' | 'l' | 'I' | '\'' | '|' => 278.0,
        'f' | 't' | 'r' | '-' | '(' | ')' => 333.0,
        'm' | 'M' | 'W' => 833.0,
        'w' => 722.0,
        'A'..='Z' => 667.0,
        _ => 556.0,
    }
}

/// 文字列の描画幅（mm）の近似値
pub fn text_width_mm(text: &str, font_size: f32) -> f32 {
    let units: f32 = text.chars().map(helvetica_advance).sum();
    pt_to_mm(units / 1000.0 * font_size)
}

/// セル幅に収まるよう単語単位で折り返す
///
/// 文字は落とさない。1語で幅を超える場合は文字単位で折る。空文字は1行（空）。
pub fn wrap_text(text: &str, width_mm: f32, font_size: f32) -> Vec<String> {
    let available = width_mm - CELL_PADDING_MM * 2.0;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if text_width_mm(&candidate, font_size) <= available {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for c in word.chars() {
            current.push(c);
            if current.chars().count() > 1 && text_width_mm(&current, font_size) > available {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_fits_page() {
        assert!(table_width_mm() <= USABLE_WIDTH_MM);
        assert!((column_x_mm(0) - MARGIN_MM).abs() < 0.001);
        assert!((column_x_mm(TOTAL_COLUMN) - (MARGIN_MM + 126.0)).abs() < 0.001);
    }

    #[test]
    fn test_first_page_holds_fewer_rows() {
        assert!(body_height_per_page(true) < body_height_per_page(false));
        assert!(body_height_per_page(true) > BODY_ROW_HEIGHT_MM * 10.0);
    }

    #[test]
    fn test_row_height_grows_with_lines() {
        assert_eq!(body_row_height_mm(0), BODY_ROW_HEIGHT_MM);
        assert_eq!(body_row_height_mm(1), BODY_ROW_HEIGHT_MM);
        assert_eq!(body_row_height_mm(3), BODY_ROW_HEIGHT_MM + 2.0 * BODY_LINE_HEIGHT_MM);
    }

    #[test]
    fn test_conversion() {
        assert!((MM_TO_PT - 2.835).abs() < 0.01);
        assert!((mm_to_pt(10.0) - 28.35).abs() < 0.1);
        assert!((pt_to_mm(mm_to_pt(42.0)) - 42.0).abs() < 0.001);
    }

    #[test]
    fn test_fit_within_downscales() {
        let (w, h) = fit_within(1000.0, 500.0, 500.0, 500.0);
        assert!((w - 500.0).abs() < 0.001);
        assert!((h - 250.0).abs() < 0.001);
    }

    #[test]
    fn test_fit_within_never_upscales() {
        assert_eq!(fit_within(100.0, 50.0, 500.0, 500.0), (100.0, 50.0));
        assert_eq!(fit_within(0.0, 50.0, 500.0, 500.0), (0.0, 0.0));
    }

    #[test]
    fn test_fit_pixels() {
        assert_eq!(fit_pixels(1200, 1600, 600, 800), (600, 800));
        assert_eq!(fit_pixels(3000, 1000, 600, 800), (600, 200));
        assert_eq!(fit_pixels(300, 200, 600, 800), (300, 200));
    }

    #[test]
    fn test_wrap_short_text() {
        assert_eq!(wrap_text("12 Oak", 70.0, BODY_FONT_SIZE), vec!["12 Oak"]);
        assert_eq!(wrap_text("", 70.0, BODY_FONT_SIZE), vec![""]);
    }

    #[test]
    fn test_wrap_keeps_every_word() {
        let long = "1234 Massachusetts Avenue Northwest Apartment 1205 Rear Building";
        let lines = wrap_text(long, 70.0, BODY_FONT_SIZE);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), long);
        for line in &lines {
            assert!(text_width_mm(line, BODY_FONT_SIZE) <= 70.0 - CELL_PADDING_MM * 2.0 + 0.01);
        }
    }

    #[test]
    fn test_wrap_breaks_long_word() {
        let word = "WO-2024-0000000000000000000000";
        let lines = wrap_text(word, 28.0, BODY_FONT_SIZE);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }
}
