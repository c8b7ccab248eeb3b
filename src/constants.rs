//! Centralized constants used across the application.
//!
//! This module contains magic numbers and configuration values that are used
//! in multiple places or would benefit from being named constants.

/// Default window width in pixels
pub const DEFAULT_WINDOW_WIDTH: f32 = 1280.0;

/// Default window height in pixels
pub const DEFAULT_WINDOW_HEIGHT: f32 = 840.0;

/// Maximum displayed canvas width in logical pixels.
/// Uploaded images are scaled down (never up) to fit these bounds.
pub const MAX_CANVAS_WIDTH: f32 = 600.0;

/// Maximum displayed canvas height in logical pixels
pub const MAX_CANVAS_HEIGHT: f32 = 600.0;

/// Uploads larger than this are rejected with a notice
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Font size for newly added captions
pub const DEFAULT_CAPTION_SIZE: f32 = 32.0;

/// Vertical spacing between default positions of successively added captions
pub const CAPTION_STACK_OFFSET: f32 = 60.0;

/// Default anchor position (canvas coordinates) for the first caption
pub const CAPTION_DEFAULT_X: f32 = 50.0;
pub const CAPTION_DEFAULT_Y: f32 = 50.0;

/// Stroke width of the black outline drawn under caption fill text
pub const CAPTION_STROKE_WIDTH: f32 = 2.0;

/// Per-character width factor for the caption hit box.
/// A monospace-width heuristic, not exact glyph metrics.
pub const HIT_BOX_WIDTH_FACTOR: f32 = 0.6;

/// How long a toast notice stays on screen, in seconds
pub const NOTICE_LIFETIME_SECS: f64 = 4.0;

/// Side length of gallery thumbnails in the gallery panel
pub const GALLERY_THUMBNAIL_SIZE: f32 = 120.0;
