use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::schema::ThumbnailSize;

/// Resize an image to exactly `size` and re-encode it in the format implied
/// by `ext`.
pub fn render(bytes: &[u8], ext: &str, size: ThumbnailSize) -> Result<Vec<u8>, String> {
    let format = ImageFormat::from_extension(ext)
        .ok_or_else(|| format!("unsupported image extension '{ext}'"))?;

    let source = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let resized = source.resize_exact(size.width, size.height, FilterType::Triangle);

    // JPEG has no alpha channel.
    let resized = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
        _ => DynamicImage::ImageRgba8(resized.to_rgba8()),
    };

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, format)
        .map_err(|e| e.to_string())?;
    Ok(out.into_inner())
}

/// Whether the bytes carry a recognizable image header.
pub fn sniff(bytes: &[u8]) -> bool {
    image::guess_format(bytes).is_ok()
}
