//! Centralized color theme for the application.
//!
//! This module provides all colors used throughout the editor UI and
//! caption rendering. Modify values here to change the color scheme.

use bevy::prelude::Color;
use bevy_egui::egui;

// ============================================================================
// Caption Colors
// ============================================================================

/// Default caption fill color (white, outlined in black for legibility)
pub const CAPTION_DEFAULT: Color = Color::srgb(1.0, 1.0, 1.0);

/// Caption color palette for the settings picker
pub fn caption_colors() -> [(Color, &'static str, egui::Color32); 8] {
    [
        (Color::srgb(1.0, 1.0, 1.0), "White", egui::Color32::WHITE),
        (Color::srgb(0.0, 0.0, 0.0), "Black", egui::Color32::BLACK),
        (Color::srgb(1.0, 1.0, 0.0), "Yellow", egui::Color32::YELLOW),
        (Color::srgb(1.0, 0.0, 0.0), "Red", egui::Color32::RED),
        (Color::srgb(0.0, 0.0, 1.0), "Blue", egui::Color32::BLUE),
        (
            Color::srgb(0.0, 0.8, 0.0),
            "Green",
            egui::Color32::from_rgb(0, 204, 0),
        ),
        (
            Color::srgb(1.0, 0.5, 0.0),
            "Orange",
            egui::Color32::from_rgb(255, 127, 0),
        ),
        (
            Color::srgb(0.5, 0.0, 0.5),
            "Purple",
            egui::Color32::from_rgb(127, 0, 127),
        ),
    ]
}

// ============================================================================
// Canvas Colors
// ============================================================================

/// Window clear color behind the canvas
pub const CANVAS_BACKDROP: Color = Color::srgb(0.13, 0.13, 0.15);

// ============================================================================
// Notice Colors
// ============================================================================

/// Background for informational toast notices
pub const NOTICE_INFO_BG: egui::Color32 = egui::Color32::from_rgb(45, 45, 48);

/// Background for error (destructive) toast notices
pub const NOTICE_ERROR_BG: egui::Color32 = egui::Color32::from_rgb(90, 30, 30);

/// Text color for toast notices
pub const NOTICE_TEXT: egui::Color32 = egui::Color32::from_rgb(230, 230, 230);

/// Convert a Bevy color to an opaque egui color for UI swatches.
pub fn egui_color(color: Color) -> egui::Color32 {
    let srgba = color.to_srgba();
    egui::Color32::from_rgb(
        (srgba.red * 255.0) as u8,
        (srgba.green * 255.0) as u8,
        (srgba.blue * 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_swatches_match_colors() {
        for (color, _, swatch) in caption_colors() {
            let srgba = color.to_srgba();
            assert_eq!(swatch.r(), (srgba.red * 255.0) as u8);
            assert_eq!(swatch.g(), (srgba.green * 255.0) as u8);
            assert_eq!(swatch.b(), (srgba.blue * 255.0) as u8);
        }
    }

    #[test]
    fn test_egui_color_roundtrip() {
        let c = egui_color(Color::srgb(1.0, 0.5, 0.0));
        assert_eq!(c.r(), 255);
        assert_eq!(c.b(), 0);
    }
}
