use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};
use tracing::warn;

use crate::formats::output_image_name;

pub const PLACEHOLDER_WIDTH: u32 = 800;
pub const PLACEHOLDER_HEIGHT: u32 = 600;

const TEXT_COLOR: Rgb<u8> = Rgb([102, 102, 102]);
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_SCALE: u32 = 3;
const GLYPH_GAP: u32 = 1;
const LINE_GAP: u32 = 2;

// 5x7 pixel font, one byte per row, bit 4 is the leftmost column. Text is
// uppercased before lookup; characters without a glyph advance as blanks.
fn glyph_rows(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        ' ' => [0x00; 7],
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        _ => return None,
    };
    Some(rows)
}

fn draw_line_centered(canvas: &mut RgbImage, text: &str, top_y: u32) {
    let chars: Vec<char> = text.to_uppercase().chars().collect();
    if chars.is_empty() {
        return;
    }
    let advance = (GLYPH_WIDTH + GLYPH_GAP) * GLYPH_SCALE;
    let line_width = chars.len() as u32 * advance - GLYPH_GAP * GLYPH_SCALE;
    let mut x = (canvas.width() / 2).saturating_sub(line_width / 2);

    for ch in chars {
        if let Some(rows) = glyph_rows(ch) {
            for (row_idx, row) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if row & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    for dy in 0..GLYPH_SCALE {
                        for dx in 0..GLYPH_SCALE {
                            let px = x + col * GLYPH_SCALE + dx;
                            let py = top_y + row_idx as u32 * GLYPH_SCALE + dy;
                            if px < canvas.width() && py < canvas.height() {
                                canvas.put_pixel(px, py, TEXT_COLOR);
                            }
                        }
                    }
                }
            }
        }
        x += advance;
    }
}

fn render_placeholder(images_dir: &Path, format_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(images_dir).map_err(|err| {
        anyhow!(
            "Failed to create image directory {}: {}",
            images_dir.display(),
            err
        )
    })?;

    let mut canvas = RgbImage::from_pixel(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, BACKGROUND);
    let size_line = format!("{}x{}", PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT);
    let lines = ["Placeholder Image", format_name, size_line.as_str()];

    let line_height = GLYPH_HEIGHT * GLYPH_SCALE;
    let gap = LINE_GAP * GLYPH_SCALE;
    let block_height = lines.len() as u32 * line_height + (lines.len() as u32 - 1) * gap;
    let mut y = PLACEHOLDER_HEIGHT.saturating_sub(block_height) / 2;
    for line in lines {
        draw_line_centered(&mut canvas, line, y);
        y += line_height + gap;
    }

    let path = images_dir.join(output_image_name(format_name));
    canvas
        .save(&path)
        .map_err(|err| anyhow!("Failed to save placeholder {}: {}", path.display(), err))?;
    Ok(path)
}

// Any failure is logged and swallowed; a missing placeholder must not sink
// the ad that needed it.
pub fn generate_placeholder(images_dir: &Path, format_name: &str) -> Option<PathBuf> {
    match render_placeholder(images_dir, format_name) {
        Ok(path) => Some(path),
        Err(err) => {
            warn!("Failed to create placeholder image: {:#}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_renders_an_annotated_canvas() {
        let dir = tempfile::tempdir().unwrap();
        let path = generate_placeholder(dir.path(), "Banner Ad").unwrap();

        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.starts_with("ad_banner_ad_"));
        assert!(file_name.ends_with(".png"));

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!((img.width(), img.height()), (800, 600));
        assert_eq!(*img.get_pixel(0, 0), Rgb([255, 255, 255]));
        let text_pixels = img
            .pixels()
            .filter(|pixel| **pixel == Rgb([102, 102, 102]))
            .count();
        assert!(text_pixels > 0);
    }

    #[test]
    fn placeholder_creates_the_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deep").join("images");
        let path = generate_placeholder(&nested, "Print Ad").unwrap();
        assert!(path.starts_with(&nested));
        assert!(path.exists());
    }

    #[test]
    fn placeholder_returns_none_when_directory_is_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"occupied").unwrap();
        assert!(generate_placeholder(&blocker, "Banner Ad").is_none());
    }

    #[test]
    fn glyphs_cover_letters_digits_and_spaces() {
        for ch in ('A'..='Z').chain('0'..='9').chain(std::iter::once(' ')) {
            assert!(glyph_rows(ch).is_some(), "missing glyph for {ch:?}");
        }
        assert!(glyph_rows('?').is_none());
    }
}
