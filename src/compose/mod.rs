//! CPU compositing for export.
//!
//! Flattens the canvas exactly as displayed: the base image resized to the
//! display bounds, then each caption stroked in black and filled in its own
//! color, in insertion order. Runs entirely on the CPU with `image` and
//! `ab_glyph` so export never depends on the GPU frame.

use ab_glyph::{Font, PxScale, ScaleFont};
use bevy::prelude::*;
use image::{imageops, Rgba, RgbaImage};

use crate::constants::CAPTION_STROKE_WIDTH;
use crate::editor::captions::FontWeight;
use crate::fonts::CaptionFonts;

/// A caption snapshot ready for rasterization
pub struct CaptionDraw {
    pub text: String,
    /// Baseline center, canvas coordinates
    pub anchor: Vec2,
    pub font_size: f32,
    pub color: [u8; 4],
    pub weight: FontWeight,
}

/// Convert a Bevy color to RGBA bytes for compositing.
pub fn color_to_rgba8(color: Color) -> [u8; 4] {
    let srgba = color.to_srgba();
    [
        (srgba.red * 255.0).round() as u8,
        (srgba.green * 255.0).round() as u8,
        (srgba.blue * 255.0).round() as u8,
        (srgba.alpha * 255.0).round() as u8,
    ]
}

/// Flatten the canvas into a single RGBA buffer at the display size.
pub fn flatten(
    source: &RgbaImage,
    display: (u32, u32),
    captions: &[CaptionDraw],
    fonts: &CaptionFonts,
) -> Result<RgbaImage, String> {
    let (width, height) = display;
    let mut buffer = imageops::resize(source, width, height, imageops::FilterType::Triangle);

    for caption in captions {
        if caption.text.is_empty() {
            continue;
        }

        let font = fonts
            .for_weight(caption.weight)
            .ok_or_else(|| "No caption font is available for export".to_string())?;

        let s = CAPTION_STROKE_WIDTH;
        for (dx, dy) in [
            (-s, 0.0),
            (s, 0.0),
            (0.0, -s),
            (0.0, s),
            (-s, -s),
            (-s, s),
            (s, -s),
            (s, s),
        ] {
            draw_text_line(
                &mut buffer,
                &font.font,
                &caption.text,
                caption.font_size,
                caption.anchor + Vec2::new(dx, dy),
                [0, 0, 0, 255],
            );
        }
        draw_text_line(
            &mut buffer,
            &font.font,
            &caption.text,
            caption.font_size,
            caption.anchor,
            caption.color,
        );
    }

    Ok(buffer)
}

/// Encode a flattened buffer as PNG bytes.
pub fn encode_png(buffer: &RgbaImage) -> Result<Vec<u8>, String> {
    let mut bytes = Vec::new();
    buffer
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .map_err(|e| format!("Failed to encode PNG: {}", e))?;
    Ok(bytes)
}

/// Advance width of a single line at the given pixel size.
fn line_width<F: Font>(font: &F, text: &str, scale: PxScale) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0f32;
    let mut prev = None;
    for ch in text.chars() {
        let gid = font.glyph_id(ch);
        if let Some(prev_id) = prev {
            width += scaled.kern(prev_id, gid);
        }
        width += scaled.h_advance(gid);
        prev = Some(gid);
    }
    width
}

/// Rasterize one line of text, horizontally centered on the anchor with
/// the baseline at the anchor's y.
fn draw_text_line<F: Font>(
    buffer: &mut RgbaImage,
    font: &F,
    text: &str,
    font_size: f32,
    anchor: Vec2,
    color: [u8; 4],
) {
    let scale = PxScale::from(font_size);
    let scaled = font.as_scaled(scale);

    let mut pen_x = anchor.x - line_width(font, text, scale) / 2.0;
    let baseline_y = anchor.y;
    let mut prev = None;

    for ch in text.chars() {
        let gid = font.glyph_id(ch);
        if let Some(prev_id) = prev {
            pen_x += scaled.kern(prev_id, gid);
        }

        let glyph = gid.with_scale_and_position(scale, ab_glyph::point(pen_x, baseline_y));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = bounds.min.x + px as f32;
                let y = bounds.min.y + py as f32;
                if x < 0.0 || y < 0.0 {
                    return;
                }
                let (x, y) = (x as u32, y as u32);
                if x < buffer.width() && y < buffer.height() {
                    blend_pixel(buffer, x, y, color, coverage);
                }
            });
        }

        pen_x += scaled.h_advance(gid);
        prev = Some(gid);
    }
}

/// Source-over blend of a single pixel with coverage-scaled alpha.
fn blend_pixel(buffer: &mut RgbaImage, x: u32, y: u32, color: [u8; 4], coverage: f32) {
    let alpha = (coverage * color[3] as f32 / 255.0).clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }

    let dst = buffer.get_pixel_mut(x, y);
    for i in 0..3 {
        let src = color[i] as f32;
        let over = src * alpha + dst.0[i] as f32 * (1.0 - alpha);
        dst.0[i] = over.round() as u8;
    }
    dst.0[3] = dst.0[3].max((alpha * 255.0).round() as u8);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::{egui_bundled_font_bytes, LoadedFont};

    fn test_fonts() -> CaptionFonts {
        CaptionFonts {
            regular: egui_bundled_font_bytes().and_then(LoadedFont::from_bytes),
            bold: None,
            registered: false,
        }
    }

    fn solid_image(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    #[test]
    fn test_flatten_resizes_to_display_bounds() {
        let source = solid_image(64, 32, [200, 40, 40, 255]);
        let flat = flatten(&source, (600, 300), &[], &test_fonts()).unwrap();
        assert_eq!(flat.dimensions(), (600, 300));
        assert_eq!(flat.get_pixel(300, 150).0, [200, 40, 40, 255]);
    }

    #[test]
    fn test_flatten_draws_caption_pixels() {
        let source = solid_image(64, 64, [10, 10, 10, 255]);
        let captions = [CaptionDraw {
            text: "LOL".to_string(),
            anchor: Vec2::new(32.0, 40.0),
            font_size: 24.0,
            color: [255, 255, 255, 255],
            weight: FontWeight::Normal,
        }];
        let flat = flatten(&source, (64, 64), &captions, &test_fonts()).unwrap();

        let touched = flat
            .pixels()
            .filter(|p| p.0 != [10, 10, 10, 255])
            .count();
        assert!(touched > 0, "caption left no pixels");

        // Both the white fill and the black outline should be present
        assert!(flat.pixels().any(|p| p.0[0] > 200));
        assert!(flat.pixels().any(|p| p.0 != [10, 10, 10, 255] && p.0[0] < 50));
    }

    #[test]
    fn test_flatten_errors_without_font() {
        let source = solid_image(8, 8, [0, 0, 0, 255]);
        let captions = [CaptionDraw {
            text: "X".to_string(),
            anchor: Vec2::new(4.0, 6.0),
            font_size: 8.0,
            color: [255, 255, 255, 255],
            weight: FontWeight::Bold,
        }];
        let empty = CaptionFonts {
            regular: None,
            bold: None,
            registered: false,
        };
        assert!(flatten(&source, (8, 8), &captions, &empty).is_err());
    }

    #[test]
    fn test_encode_png_roundtrip() {
        let source = solid_image(16, 16, [5, 120, 200, 255]);
        let bytes = encode_png(&source).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (16, 16));
        assert_eq!(decoded.get_pixel(8, 8).0, [5, 120, 200, 255]);
    }

    #[test]
    fn test_line_width_grows_with_text() {
        let fonts = test_fonts();
        let font = &fonts.regular.as_ref().unwrap().font;
        let scale = PxScale::from(32.0);
        let short = line_width(font, "LOL", scale);
        let long = line_width(font, "LOOOOOOOOL", scale);
        assert!(long > short);
        assert!(short > 0.0);
    }
}
