use super::exif::read_orientation;
use image::imageops::FilterType;
use image::DynamicImage;
use invoice_report_common::layout::fit_pixels;

/// 受け取ったバイト列をレポート用の画像にする
///
/// デコードできない場合は None（呼び出し側で「画像なし」として扱う）。
pub fn optimize_for_report(bytes: &[u8], max_width: u32, max_height: u32) -> Option<DynamicImage> {
    let img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            tracing::warn!("cannot decode image: {}", e);
            return None;
        }
    };
    let orientation = read_orientation(bytes);
    Some(optimize_image(img, orientation, max_width, max_height))
}

/// 向きの補正・RGB化・縮小
pub fn optimize_image(img: DynamicImage, orientation: u32, max_width: u32, max_height: u32) -> DynamicImage {
    let img = match orientation {
        3 => img.rotate180(),
        6 => img.rotate90(),
        8 => img.rotate270(),
        _ => img,
    };

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width <= max_width && height <= max_height {
        return DynamicImage::ImageRgb8(rgb);
    }

    let (new_width, new_height) = fit_pixels(width, height, max_width, max_height);
    tracing::debug!("resize {}x{} -> {}x{}", width, height, new_width, new_height);
    DynamicImage::ImageRgb8(image::imageops::resize(&rgb, new_width, new_height, FilterType::Lanczos3))
}
