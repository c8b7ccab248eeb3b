//! Hit testing for captions under the pointer.
//!
//! The hit box is an approximation: a fixed per-character width factor
//! rather than exact glyph metrics. Coarse, but plenty for a drag handle.

use bevy::prelude::*;

use crate::constants::HIT_BOX_WIDTH_FACTOR;

/// Approximate bounding box of a caption in canvas coordinates.
///
/// The box is centered horizontally on the anchor and sits entirely above
/// the baseline: from `y - font_size` to `y`.
pub fn caption_bounds(anchor: Vec2, text: &str, font_size: f32) -> (Vec2, Vec2) {
    let half_width = text.chars().count() as f32 * font_size * HIT_BOX_WIDTH_FACTOR / 2.0;
    (
        Vec2::new(anchor.x - half_width, anchor.y - font_size),
        Vec2::new(anchor.x + half_width, anchor.y),
    )
}

/// Check if a canvas-space point is inside a caption's hit box.
pub fn point_in_caption(point: Vec2, anchor: Vec2, text: &str, font_size: f32) -> bool {
    let (min, max) = caption_bounds(anchor, text, font_size);
    point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
}

/// Find the first caption whose hit box contains the point.
///
/// Callers must pass captions in insertion order; the first match wins,
/// matching the stacking tie-break.
pub fn first_hit<'a, I>(point: Vec2, captions: I) -> Option<Entity>
where
    I: IntoIterator<Item = (Entity, Vec2, &'a str, f32)>,
{
    captions
        .into_iter()
        .find(|(_, anchor, text, font_size)| point_in_caption(point, *anchor, text, *font_size))
        .map(|(entity, _, _, _)| entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_entities(n: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..n).map(|_| world.spawn_empty().id()).collect()
    }

    #[test]
    fn test_bounds_sit_above_baseline() {
        let (min, max) = caption_bounds(Vec2::new(100.0, 80.0), "LOL", 32.0);
        assert_eq!(min.y, 48.0);
        assert_eq!(max.y, 80.0);
        // width = 3 chars * 32 * 0.6 = 57.6, centered
        assert!((min.x - (100.0 - 28.8)).abs() < f32::EPSILON);
        assert!((max.x - (100.0 + 28.8)).abs() < f32::EPSILON);
    }

    #[test]
    fn test_point_on_baseline_hits() {
        let anchor = Vec2::new(100.0, 80.0);
        assert!(point_in_caption(Vec2::new(100.0, 80.0), anchor, "LOL", 32.0));
        assert!(point_in_caption(Vec2::new(100.0, 48.0), anchor, "LOL", 32.0));
        assert!(!point_in_caption(Vec2::new(100.0, 80.1), anchor, "LOL", 32.0));
        assert!(!point_in_caption(Vec2::new(100.0, 47.9), anchor, "LOL", 32.0));
    }

    #[test]
    fn test_wider_text_has_wider_box() {
        let anchor = Vec2::new(100.0, 80.0);
        let far = Vec2::new(160.0, 70.0);
        assert!(!point_in_caption(far, anchor, "LOL", 32.0));
        assert!(point_in_caption(far, anchor, "LOOOOOOOOL", 32.0));
    }

    #[test]
    fn test_first_hit_prefers_earlier_caption() {
        let entities = test_entities(2);
        let (a, b) = (entities[0], entities[1]);
        // Both boxes contain the point; the earlier listed one wins
        let anchor = Vec2::new(100.0, 80.0);
        let point = Vec2::new(100.0, 70.0);
        let hit = first_hit(
            point,
            [(a, anchor, "FIRST", 32.0), (b, anchor, "SECOND", 32.0)],
        );
        assert_eq!(hit, Some(a));
    }

    #[test]
    fn test_first_hit_skips_non_containing_captions() {
        let entities = test_entities(2);
        let (a, b) = (entities[0], entities[1]);
        let point = Vec2::new(100.0, 70.0);
        let hit = first_hit(
            point,
            [
                (a, Vec2::new(400.0, 300.0), "ELSEWHERE", 32.0),
                (b, Vec2::new(100.0, 80.0), "HERE", 32.0),
            ],
        );
        assert_eq!(hit, Some(b));
    }

    #[test]
    fn test_first_hit_none_on_empty_space() {
        let a = test_entities(1)[0];
        let hit = first_hit(
            Vec2::new(5.0, 5.0),
            [(a, Vec2::new(300.0, 300.0), "LOL", 32.0)],
        );
        assert_eq!(hit, None);
    }
}
