use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::Utc;
use image::imageops::FilterType;
use image::ImageFormat;

pub const MAX_REFERENCE_DIMENSION: u32 = 800;

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    if data.len() > 12 {
        let ftyp = &data[4..12];
        if ftyp.starts_with(b"ftyp") {
            let brand = &ftyp[4..8];
            if brand == b"heic" || brand == b"heif" || brand == b"hevc" {
                return Some("image/heic".to_string());
            }
        }
    }

    infer::get(data).map(|kind| kind.mime_type().to_string())
}

// Oversized reference images are shrunk before upload so the request stays
// small; the result is always re-encoded as PNG in the system temp directory.
pub fn prepare_reference_image(path: &Path) -> Result<PathBuf> {
    let img = image::open(path)
        .map_err(|err| anyhow!("Failed to open reference image {}: {}", path.display(), err))?;

    let (width, height) = (img.width(), img.height());
    let img = if width > MAX_REFERENCE_DIMENSION || height > MAX_REFERENCE_DIMENSION {
        img.resize(
            MAX_REFERENCE_DIMENSION,
            MAX_REFERENCE_DIMENSION,
            FilterType::Lanczos3,
        )
    } else {
        img
    };

    let output = std::env::temp_dir().join(format!("reference_image_{}.png", Utc::now().timestamp()));
    img.save_with_format(&output, ImageFormat::Png).map_err(|err| {
        anyhow!(
            "Failed to write prepared reference image {}: {}",
            output.display(),
            err
        )
    })?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn detect_mime_type_recognizes_png_magic() {
        let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(&[0u8; 16]);
        assert_eq!(detect_mime_type(&data).as_deref(), Some("image/png"));
    }

    #[test]
    fn detect_mime_type_recognizes_heic_brand() {
        let mut data = vec![0x00, 0x00, 0x00, 0x18];
        data.extend_from_slice(b"ftypheic");
        data.extend_from_slice(&[0u8; 16]);
        assert_eq!(detect_mime_type(&data).as_deref(), Some("image/heic"));
    }

    #[test]
    fn detect_mime_type_returns_none_for_unknown_bytes() {
        assert_eq!(detect_mime_type(&[0x00, 0x01, 0x02, 0x03]), None);
    }

    #[test]
    fn prepare_reference_image_shrinks_large_and_keeps_small() {
        let dir = tempfile::tempdir().unwrap();

        let large_path = dir.path().join("large.png");
        RgbImage::from_pixel(1200, 600, image::Rgb([10, 20, 30]))
            .save(&large_path)
            .unwrap();
        let prepared = prepare_reference_image(&large_path).unwrap();
        let resized = image::open(&prepared).unwrap();
        assert_eq!((resized.width(), resized.height()), (800, 400));

        let small_path = dir.path().join("small.png");
        RgbImage::from_pixel(400, 300, image::Rgb([10, 20, 30]))
            .save(&small_path)
            .unwrap();
        let prepared = prepare_reference_image(&small_path).unwrap();
        let kept = image::open(&prepared).unwrap();
        assert_eq!((kept.width(), kept.height()), (400, 300));
    }

    #[test]
    fn prepare_reference_image_rejects_missing_files() {
        let result = prepare_reference_image(Path::new("/nonexistent/reference.png"));
        assert!(result.is_err());
    }
}
