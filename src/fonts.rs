//! Caption font loading and registration.
//!
//! The same font bytes back both the on-screen captions (registered with
//! egui as the `caption` / `caption-bold` families) and the CPU export
//! rasterizer (`ab_glyph`), so what the user drags is what gets flattened.
//!
//! Fonts are discovered from platform font directories; when nothing
//! suitable is found we fall back to the font egui ships with, which keeps
//! export working on minimal systems (at the cost of a missing bold cut).

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use std::path::PathBuf;

use crate::editor::captions::FontWeight;

/// egui family name for regular-weight captions
pub const CAPTION_FAMILY: &str = "caption";

/// egui family name for bold captions
pub const CAPTION_FAMILY_BOLD: &str = "caption-bold";

/// A font usable by both egui and ab_glyph
pub struct LoadedFont {
    pub bytes: Vec<u8>,
    pub font: FontArc,
}

impl LoadedFont {
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        let font = FontArc::try_from_vec(bytes.clone()).ok()?;
        Some(Self { bytes, font })
    }
}

#[derive(Resource, Default)]
pub struct CaptionFonts {
    pub regular: Option<LoadedFont>,
    pub bold: Option<LoadedFont>,
    /// Set once the fonts have been installed into the egui context
    pub registered: bool,
}

impl CaptionFonts {
    /// Font for a caption weight, with bold falling back to regular.
    pub fn for_weight(&self, weight: FontWeight) -> Option<&LoadedFont> {
        match weight {
            FontWeight::Bold => self.bold.as_ref().or(self.regular.as_ref()),
            FontWeight::Normal => self.regular.as_ref(),
        }
    }

    /// Distance from the bottom of a laid-out text row to the glyph
    /// baseline, in pixels.
    ///
    /// egui lays rows out as ascent + descent + line gap and anchors by
    /// the row rect, while caption anchors are baselines. Adding this to
    /// a bottom-aligned draw position puts the baseline at the anchor,
    /// keeping the screen overlay in line with the export rasterizer.
    pub fn baseline_drop(&self, weight: FontWeight, font_size: f32) -> f32 {
        self.for_weight(weight)
            .map(|loaded| {
                let scaled = loaded.font.as_scaled(PxScale::from(font_size));
                scaled.line_gap() - scaled.descent()
            })
            .unwrap_or(0.0)
    }

    /// egui font family for a caption weight.
    ///
    /// Falls back to the default proportional family when the caption
    /// fonts could not be registered.
    pub fn egui_family(&self, weight: FontWeight) -> egui::FontFamily {
        if !self.registered {
            return egui::FontFamily::Proportional;
        }
        match weight {
            FontWeight::Bold if self.bold.is_some() => {
                egui::FontFamily::Name(CAPTION_FAMILY_BOLD.into())
            }
            _ if self.regular.is_some() => egui::FontFamily::Name(CAPTION_FAMILY.into()),
            _ => egui::FontFamily::Proportional,
        }
    }
}

/// Candidate font files per platform, in preference order.
fn font_candidates(bold: bool) -> Vec<PathBuf> {
    let names: &[&str] = if bold {
        &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
            "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
            "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
            "C:\\Windows\\Fonts\\arialbd.ttf",
        ]
    } else {
        &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ]
    };
    names.iter().map(PathBuf::from).collect()
}

fn load_system_font(bold: bool) -> Option<LoadedFont> {
    for path in font_candidates(bold) {
        if !path.exists() {
            continue;
        }
        match std::fs::read(&path) {
            Ok(bytes) => {
                if let Some(loaded) = LoadedFont::from_bytes(bytes) {
                    info!("Loaded caption font from {:?} (bold: {})", path, bold);
                    return Some(loaded);
                }
                warn!("Font file {:?} could not be parsed", path);
            }
            Err(e) => warn!("Failed to read font file {:?}: {}", path, e),
        }
    }
    None
}

/// Bytes of the first proportional font egui ships with.
pub(crate) fn egui_bundled_font_bytes() -> Option<Vec<u8>> {
    let defs = egui::FontDefinitions::default();
    let name = defs
        .families
        .get(&egui::FontFamily::Proportional)
        .and_then(|names| names.first())?;
    defs.font_data.get(name).map(|data| data.font.to_vec())
}

/// Startup system: locate and parse the caption fonts.
pub fn load_caption_fonts(mut fonts: ResMut<CaptionFonts>) {
    fonts.regular = load_system_font(false);
    fonts.bold = load_system_font(true);

    if fonts.regular.is_none() {
        warn!("No system caption font found, falling back to egui's bundled font");
        fonts.regular = egui_bundled_font_bytes().and_then(LoadedFont::from_bytes);
    }

    if fonts.regular.is_none() && fonts.bold.is_none() {
        error!("No usable caption font; exported memes will fail until one is available");
    }
}

/// Install the caption fonts into the egui context.
///
/// Runs in the egui pass until registration succeeds once.
pub fn register_caption_fonts(
    mut fonts: ResMut<CaptionFonts>,
    mut contexts: EguiContexts,
) -> Result {
    if fonts.registered {
        return Ok(());
    }

    let mut defs = egui::FontDefinitions::default();
    let mut any = false;

    if let Some(ref regular) = fonts.regular {
        defs.font_data.insert(
            CAPTION_FAMILY.to_owned(),
            std::sync::Arc::new(egui::FontData::from_owned(regular.bytes.clone())),
        );
        defs.families.insert(
            egui::FontFamily::Name(CAPTION_FAMILY.into()),
            vec![CAPTION_FAMILY.to_owned()],
        );
        any = true;
    }

    if let Some(ref bold) = fonts.bold {
        defs.font_data.insert(
            CAPTION_FAMILY_BOLD.to_owned(),
            std::sync::Arc::new(egui::FontData::from_owned(bold.bytes.clone())),
        );
        defs.families.insert(
            egui::FontFamily::Name(CAPTION_FAMILY_BOLD.into()),
            vec![CAPTION_FAMILY_BOLD.to_owned()],
        );
        any = true;
    }

    if any {
        contexts.ctx_mut()?.set_fonts(defs);
    }
    fonts.registered = true;

    Ok(())
}

pub struct CaptionFontPlugin;

impl Plugin for CaptionFontPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CaptionFonts>()
            .add_systems(Startup, load_caption_fonts)
            .add_systems(EguiPrimaryContextPass, register_caption_fonts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_font_is_available() {
        // egui always ships at least one proportional font
        let bytes = egui_bundled_font_bytes().expect("egui bundled font");
        assert!(!bytes.is_empty());
        assert!(LoadedFont::from_bytes(bytes).is_some());
    }

    #[test]
    fn test_bold_falls_back_to_regular() {
        let bytes = egui_bundled_font_bytes().unwrap();
        let fonts = CaptionFonts {
            regular: LoadedFont::from_bytes(bytes),
            bold: None,
            registered: false,
        };
        assert!(fonts.for_weight(FontWeight::Bold).is_some());
    }

    #[test]
    fn test_baseline_drop_accounts_for_descent() {
        let fonts = CaptionFonts {
            regular: egui_bundled_font_bytes().and_then(LoadedFont::from_bytes),
            bold: None,
            registered: false,
        };
        let drop = fonts.baseline_drop(FontWeight::Normal, 32.0);

        // Descenders hang below the baseline, so the drop is positive,
        // and it stays a small fraction of the font size
        assert!(drop > 0.0);
        assert!(drop < 16.0);

        // And it matches the metrics the export rasterizer draws with
        let expected = {
            let scaled = fonts
                .regular
                .as_ref()
                .unwrap()
                .font
                .as_scaled(PxScale::from(32.0));
            scaled.line_gap() - scaled.descent()
        };
        assert!((drop - expected).abs() < f32::EPSILON);
    }

    #[test]
    fn test_baseline_drop_is_zero_without_fonts() {
        let fonts = CaptionFonts::default();
        assert_eq!(fonts.baseline_drop(FontWeight::Bold, 32.0), 0.0);
    }

    #[test]
    fn test_unregistered_family_is_proportional() {
        let fonts = CaptionFonts::default();
        assert_eq!(
            fonts.egui_family(FontWeight::Normal),
            egui::FontFamily::Proportional
        );
    }
}
