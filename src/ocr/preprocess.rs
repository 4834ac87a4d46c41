use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};

/// Upscale factor for small OSD text.
pub const DEFAULT_SCALE_FACTOR: f32 = 1.2;

/// True if there is nothing to recognize.
pub fn is_empty_image(img: Option<&DynamicImage>) -> bool {
    match img {
        None => true,
        Some(img) => img.width() == 0 || img.height() == 0,
    }
}

/// Converts to single-channel 8-bit grayscale.
///
/// 8-bit grayscale input is copied as-is. Everything else is reduced to RGB
/// and weighted with BT.601 luma (0.299 R + 0.587 G + 0.114 B), rounded.
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    match img {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => {
            let rgb = other.to_rgb8();
            ImageBuffer::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                Luma([bt601_luma(r, g, b)])
            })
        }
    }
}

fn bt601_luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
    ((weighted + 500) / 1000) as u8
}

/// Scales both dimensions by `factor` using linear interpolation.
pub fn upscale(img: &GrayImage, factor: f32) -> GrayImage {
    let (w, h) = img.dimensions();
    let new_w = scaled_dimension(w, factor);
    let new_h = scaled_dimension(h, factor);

    if (new_w, new_h) == (w, h) {
        return img.clone();
    }

    imageops::resize(img, new_w, new_h, FilterType::Triangle)
}

fn scaled_dimension(size: u32, factor: f32) -> u32 {
    ((size as f64 * factor as f64).round() as u32).max(1)
}

/// Full preprocessing: grayscale, then upscale.
pub fn prepare_for_ocr(img: &DynamicImage, factor: f32) -> GrayImage {
    upscale(&to_grayscale(img), factor)
}
