use crate::error::{InvoiceError, Result};
use crate::images::ReportImage;
use chrono::NaiveDateTime;
use image::codecs::jpeg::JpegEncoder;
use invoice_report_common::export::pdf_core::{title_case, ReportTable, TOTAL_LABEL};
use invoice_report_common::layout::{
    column_x_mm, fit_within, pt_to_mm, text_width_mm, BODY_FONT_SIZE, BODY_LINE_HEIGHT_MM,
    BODY_ROW_HEIGHT_MM, CELL_PADDING_MM, HEADER_FONT_SIZE, HEADER_ROW_HEIGHT_MM, IMAGE_MAX_HEIGHT_MM,
    IMAGE_MAX_WIDTH_MM, LETTER_HEIGHT_MM, LETTER_WIDTH_MM, LINK_COLUMN, MARGIN_MM, TABLE_COLUMNS,
    TITLE_BLOCK_HEIGHT_MM, TITLE_FONT_SIZE, TOTAL_COLUMN,
};
use printpdf::image_crate::codecs::jpeg::JpegDecoder;
use printpdf::path::PaintMode;
use printpdf::{
    Actions, BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, LinkAnnotation, Mm,
    PdfDocument, PdfLayerReference, Rect, Rgb,
};
use std::io::{BufWriter, Cursor};
use std::ops::Range;

/// 画像ページに埋め込むJPEGの品質
const JPEG_QUALITY: u8 = 85;

/// 描画結果（PDFのバイト列とページ構成）
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub table_pages: usize,
    pub image_pages: usize,
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn header_fill() -> Color {
    rgb(0.5, 0.5, 0.5)
}

fn body_fill() -> Color {
    rgb(0.96, 0.96, 0.86)
}

fn total_fill() -> Color {
    rgb(0.83, 0.83, 0.83)
}

fn black() -> Color {
    rgb(0.0, 0.0, 0.0)
}

fn white() -> Color {
    rgb(0.96, 0.96, 0.96)
}

fn link_blue() -> Color {
    rgb(0.0, 0.0, 1.0)
}

fn pdf_error(context: &str, e: impl std::fmt::Debug) -> InvoiceError {
    InvoiceError::ReportGeneration(format!("{}: {:?}", context, e))
}

/// 請求表と画像ページからPDFを作る
pub fn render_report(
    table: &ReportTable,
    images: &[Option<ReportImage>],
    subcontractor: &str,
    generated: NaiveDateTime,
) -> Result<RenderedReport> {
    let title = format!("Invoice Summary - {}", title_case(subcontractor.trim()));
    let (doc, page1, layer1) = PdfDocument::new(
        &title,
        Mm(LETTER_WIDTH_MM),
        Mm(LETTER_HEIGHT_MM),
        "Layer 1",
    );

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| pdf_error("font", e))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| pdf_error("font", e))?,
    };

    // 表のページ
    let pages = table.pages();
    let last_page = pages.len() - 1;
    for (index, range) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (page, layer) = doc.add_page(Mm(LETTER_WIDTH_MM), Mm(LETTER_HEIGHT_MM), "Layer 1");
            doc.get_page(page).get_layer(layer)
        };

        let mut top = LETTER_HEIGHT_MM - MARGIN_MM;
        if index == 0 {
            draw_title(&layer, &fonts, &title, generated);
            top -= TITLE_BLOCK_HEIGHT_MM;
        }
        draw_table_page(&layer, &fonts, table, range.clone(), top, index == last_page);
    }

    // 画像は1ページに1枚
    let mut image_pages = 0;
    for report_image in images.iter().flatten() {
        let pdf_image = match to_pdf_image(report_image) {
            Ok(img) => img,
            Err(e) => {
                tracing::warn!("skipping image {}: {}", report_image.id, e);
                continue;
            }
        };
        let (page, layer) = doc.add_page(Mm(LETTER_WIDTH_MM), Mm(LETTER_HEIGHT_MM), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        place_image(&layer, pdf_image, report_image.width(), report_image.height());
        image_pages += 1;
    }

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer).map_err(|e| pdf_error("save", e))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| InvoiceError::ReportGeneration(format!("save: {}", e)))?;

    Ok(RenderedReport {
        bytes,
        table_pages: pages.len(),
        image_pages,
    })
}

fn draw_title(layer: &PdfLayerReference, fonts: &Fonts, title: &str, generated: NaiveDateTime) {
    let top = LETTER_HEIGHT_MM - MARGIN_MM;
    let center = LETTER_WIDTH_MM / 2.0;

    layer.set_fill_color(black());
    let title_width = text_width_mm(title, TITLE_FONT_SIZE);
    layer.use_text(
        title,
        TITLE_FONT_SIZE,
        Mm(center - title_width / 2.0),
        Mm(top - 8.0),
        &fonts.bold,
    );

    let stamp = format!("Generated: {}", generated.format("%Y-%m-%d %H:%M"));
    layer.use_text(stamp, HEADER_FONT_SIZE, Mm(MARGIN_MM), Mm(top - 17.0), &fonts.regular);
}

/// 1ページ分の表を描画（見出しは毎ページ、合計行は最終ページのみ）
fn draw_table_page(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    table: &ReportTable,
    range: Range<usize>,
    top: f32,
    with_total: bool,
) {
    layer.set_outline_color(black());
    layer.set_outline_thickness(0.5);

    // 見出し
    let mut y = top;
    for (index, column) in TABLE_COLUMNS.iter().enumerate() {
        draw_cell_box(layer, index, y, HEADER_ROW_HEIGHT_MM, header_fill());
        layer.set_fill_color(white());
        draw_cell_text(
            layer,
            &fonts.bold,
            index,
            y,
            HEADER_ROW_HEIGHT_MM,
            column.label,
            HEADER_FONT_SIZE,
            index == TOTAL_COLUMN,
        );
    }
    y -= HEADER_ROW_HEIGHT_MM;

    // 本文（折り返した行数に合わせて行の高さを伸ばす）
    for row in &table.rows[range] {
        let height = row.height_mm();
        for (index, lines) in row.lines.iter().enumerate() {
            draw_cell_box(layer, index, y, height, body_fill());
            layer.set_fill_color(black());
            draw_cell_lines(
                layer,
                &fonts.regular,
                index,
                y,
                height,
                lines,
                BODY_FONT_SIZE,
                index == TOTAL_COLUMN,
            );
        }

        draw_cell_box(layer, LINK_COLUMN, y, height, body_fill());
        match &row.link {
            Some(url) => {
                layer.set_fill_color(link_blue());
                draw_cell_text(
                    layer,
                    &fonts.regular,
                    LINK_COLUMN,
                    y,
                    height,
                    row.link_label(),
                    BODY_FONT_SIZE,
                    false,
                );
                let x = column_x_mm(LINK_COLUMN);
                let width = TABLE_COLUMNS[LINK_COLUMN].width_mm;
                let area = Rect::new(Mm(x), Mm(y - height), Mm(x + width), Mm(y));
                layer.add_link_annotation(LinkAnnotation::new(
                    area,
                    None,
                    None,
                    Actions::uri(url.clone()),
                    None,
                ));
            }
            None => {
                layer.set_fill_color(black());
                draw_cell_text(
                    layer,
                    &fonts.regular,
                    LINK_COLUMN,
                    y,
                    height,
                    row.link_label(),
                    BODY_FONT_SIZE,
                    false,
                );
            }
        }
        y -= height;
    }

    if !with_total {
        return;
    }

    // 合計行: WO# 列に "TOTAL:"、Total 列に右寄せで合計
    for index in 0..TABLE_COLUMNS.len() {
        draw_cell_box(layer, index, y, BODY_ROW_HEIGHT_MM, total_fill());
    }
    layer.set_fill_color(black());
    draw_cell_text(
        layer,
        &fonts.bold,
        TOTAL_COLUMN - 1,
        y,
        BODY_ROW_HEIGHT_MM,
        TOTAL_LABEL,
        BODY_FONT_SIZE,
        false,
    );
    draw_cell_text(
        layer,
        &fonts.bold,
        TOTAL_COLUMN,
        y,
        BODY_ROW_HEIGHT_MM,
        &table.total_text(),
        BODY_FONT_SIZE,
        true,
    );
}

fn draw_cell_box(layer: &PdfLayerReference, column: usize, top: f32, height: f32, fill: Color) {
    let x = column_x_mm(column);
    let width = TABLE_COLUMNS[column].width_mm;
    layer.set_fill_color(fill);
    let cell = Rect::new(Mm(x), Mm(top - height), Mm(x + width), Mm(top)).with_mode(PaintMode::FillStroke);
    layer.add_rect(cell);
}

/// 1行のラベル（見出し・リンク・合計）
#[allow(clippy::too_many_arguments)]
fn draw_cell_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    column: usize,
    top: f32,
    height: f32,
    text: &str,
    font_size: f32,
    align_right: bool,
) {
    draw_cell_lines(
        layer,
        font,
        column,
        top,
        height,
        &[text.to_string()],
        font_size,
        align_right,
    );
}

/// 折り返し済みの行をセル内で上下中央に並べる
#[allow(clippy::too_many_arguments)]
fn draw_cell_lines(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    column: usize,
    top: f32,
    height: f32,
    lines: &[String],
    font_size: f32,
    align_right: bool,
) {
    let width = TABLE_COLUMNS[column].width_mm;
    let cap_height = pt_to_mm(font_size) * 0.7;
    let block_top = top - (height - lines.len() as f32 * BODY_LINE_HEIGHT_MM) / 2.0;

    for (i, line) in lines.iter().enumerate() {
        let x = if align_right {
            column_x_mm(column) + width - CELL_PADDING_MM - text_width_mm(line, font_size)
        } else {
            column_x_mm(column) + CELL_PADDING_MM
        };
        let line_bottom = block_top - (i + 1) as f32 * BODY_LINE_HEIGHT_MM;
        let baseline = line_bottom + (BODY_LINE_HEIGHT_MM - cap_height) / 2.0;
        layer.use_text(line.as_str(), font_size, Mm(x), Mm(baseline), font);
    }
}

fn to_pdf_image(report_image: &ReportImage) -> Result<Image> {
    let rgb = report_image.image.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| InvoiceError::ReportGeneration(format!("encode image: {}", e)))?;

    let decoder = JpegDecoder::new(Cursor::new(jpeg))
        .map_err(|e| pdf_error("decode image", e))?;
    Image::try_from(decoder).map_err(|e| pdf_error("embed image", e))
}

/// 7×9インチの枠に収めてページ中央に配置（拡大しない）
fn place_image(layer: &PdfLayerReference, image: Image, width_px: u32, height_px: u32) {
    // dpi=72 → 1px = 1pt
    let natural_width = pt_to_mm(width_px as f32);
    let natural_height = pt_to_mm(height_px as f32);
    let (width, height) = fit_within(natural_width, natural_height, IMAGE_MAX_WIDTH_MM, IMAGE_MAX_HEIGHT_MM);
    let scale = if natural_width > 0.0 { width / natural_width } else { 1.0 };

    let x = (LETTER_WIDTH_MM - width) / 2.0;
    let y = (LETTER_HEIGHT_MM - height) / 2.0;
    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(72.0),
            ..Default::default()
        },
    );
}
