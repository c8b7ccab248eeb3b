//! Canvas state: the base image and its displayed size.
//!
//! The canvas uses its own coordinate space: origin at the top-left of the
//! displayed image, y growing downward, one unit per logical pixel. All
//! caption anchors, hit tests, and drag arithmetic happen in canvas
//! coordinates; conversion to Bevy world space happens at the edges.

use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use image::RgbaImage;

use crate::constants::{MAX_CANVAS_HEIGHT, MAX_CANVAS_WIDTH};

/// Marker for the background image sprite
#[derive(Component)]
pub struct CanvasSprite;

/// The current base image and its display geometry
#[derive(Resource, Default)]
pub struct CanvasState {
    /// Decoded source pixels, retained for export compositing
    pub source: Option<RgbaImage>,
    /// Display size after fitting into the canvas bounds (zero when empty)
    pub display: Vec2,
    /// The background sprite entity, despawned on replacement
    pub sprite: Option<Entity>,
}

impl CanvasState {
    pub fn has_image(&self) -> bool {
        self.source.is_some()
    }

    /// Display size rounded to whole pixels, for the export buffer.
    pub fn display_pixels(&self) -> (u32, u32) {
        (
            self.display.x.round().max(1.0) as u32,
            self.display.y.round().max(1.0) as u32,
        )
    }

    /// Convert a world position to canvas coordinates.
    /// The displayed image is centered on the world origin.
    pub fn canvas_from_world(&self, world: Vec2) -> Vec2 {
        Vec2::new(world.x + self.display.x / 2.0, self.display.y / 2.0 - world.y)
    }

    /// Convert canvas coordinates to a world position.
    pub fn world_from_canvas(&self, canvas: Vec2) -> Vec2 {
        Vec2::new(canvas.x - self.display.x / 2.0, self.display.y / 2.0 - canvas.y)
    }
}

/// Fit an image into the canvas bounds, preserving aspect ratio.
///
/// Scales down only. The width bound is applied first (rescaling height
/// proportionally), then the height bound is applied to the result.
pub fn fit_within(width: u32, height: u32, max_width: f32, max_height: f32) -> Vec2 {
    let mut w = width as f32;
    let mut h = height as f32;

    if w > max_width {
        h = h * max_width / w;
        w = max_width;
    }
    if h > max_height {
        w = w * max_height / h;
        h = max_height;
    }

    Vec2::new(w, h)
}

/// Display size for an image under the configured canvas bounds.
pub fn display_size(width: u32, height: u32) -> Vec2 {
    fit_within(width, height, MAX_CANVAS_WIDTH, MAX_CANVAS_HEIGHT)
}

/// Build a GPU texture from decoded RGBA pixels.
pub fn make_canvas_texture(rgba: &RgbaImage) -> Image {
    Image::new(
        Extent3d {
            width: rgba.width(),
            height: rgba.height(),
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        rgba.as_raw().clone(),
        TextureFormat::Rgba8UnormSrgb,
        default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_image_is_not_upscaled() {
        let size = fit_within(300, 200, 600.0, 600.0);
        assert_eq!(size, Vec2::new(300.0, 200.0));
    }

    #[test]
    fn test_wide_image_bound_by_width() {
        let size = fit_within(1200, 300, 600.0, 600.0);
        assert_eq!(size, Vec2::new(600.0, 150.0));
    }

    #[test]
    fn test_tall_image_bound_by_height() {
        let size = fit_within(300, 1200, 600.0, 600.0);
        assert_eq!(size, Vec2::new(150.0, 600.0));
    }

    #[test]
    fn test_width_bound_applies_before_height_bound() {
        // 700x800: width bound gives 600x685.7, then the height bound
        // rescales that result to 525x600
        let size = fit_within(700, 800, 600.0, 600.0);
        assert!((size.x - 525.0).abs() < 0.5);
        assert!((size.y - 600.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_fit_preserves_aspect_ratio() {
        for (w, h) in [(1920, 1080), (640, 480), (3000, 3000), (123, 4567)] {
            let size = fit_within(w, h, 600.0, 600.0);
            assert!(size.x <= 600.0 && size.y <= 600.0);
            let original = w as f32 / h as f32;
            let fitted = size.x / size.y;
            assert!(
                (original - fitted).abs() / original < 0.01,
                "aspect drifted for {}x{}: {} vs {}",
                w,
                h,
                original,
                fitted
            );
        }
    }

    #[test]
    fn test_canvas_world_roundtrip() {
        let state = CanvasState {
            source: None,
            display: Vec2::new(600.0, 400.0),
            sprite: None,
        };
        let canvas = Vec2::new(50.0, 110.0);
        let world = state.world_from_canvas(canvas);
        assert_eq!(state.canvas_from_world(world), canvas);
        // Canvas origin maps to the sprite's top-left corner
        assert_eq!(state.world_from_canvas(Vec2::ZERO), Vec2::new(-300.0, 200.0));
    }
}
