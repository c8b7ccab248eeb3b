//! Caption components, editing operations, and on-screen rendering.
//!
//! Captions are entities: the `Caption` component carries text and styling,
//! the `Transform` carries the anchor (baseline center) in world space. A
//! monotonically increasing `index` preserves insertion order; both drawing
//! and hit testing walk captions in ascending index order, so later
//! captions stack on top of earlier ones.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::constants::{
    CAPTION_DEFAULT_X, CAPTION_DEFAULT_Y, CAPTION_STACK_OFFSET, CAPTION_STROKE_WIDTH,
    DEFAULT_CAPTION_SIZE,
};
use crate::fonts::CaptionFonts;
use crate::theme;
use crate::ui::notices::{Notice, NoticeLevel};

use super::camera::EditorCamera;
use super::canvas::CanvasState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    Normal,
    #[default]
    Bold,
}

impl FontWeight {
    pub fn display_name(&self) -> &'static str {
        match self {
            FontWeight::Normal => "Normal",
            FontWeight::Bold => "Bold",
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct Caption {
    pub text: String,
    pub font_size: f32,
    pub color: Color,
    pub weight: FontWeight,
    /// Insertion-order key, unique for the session
    pub index: u64,
}

/// Source of unique, strictly increasing caption indices
#[derive(Resource, Default)]
pub struct CaptionCounter {
    pub next: u64,
}

/// Styling applied to newly added captions
#[derive(Resource)]
pub struct CaptionSettings {
    pub font_size: f32,
    pub color: Color,
    pub weight: FontWeight,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_CAPTION_SIZE,
            color: theme::CAPTION_DEFAULT,
            weight: FontWeight::Bold,
        }
    }
}

#[derive(Message)]
pub struct AddCaptionRequest {
    pub text: String,
}

#[derive(Message)]
pub struct RemoveCaptionRequest {
    pub entity: Entity,
}

/// Text is accepted only when it has non-whitespace content.
pub fn is_valid_caption_text(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Default anchor for the next caption, stacking added captions vertically.
pub fn default_anchor(existing_count: usize) -> Vec2 {
    Vec2::new(
        CAPTION_DEFAULT_X,
        CAPTION_DEFAULT_Y + CAPTION_STACK_OFFSET * existing_count as f32,
    )
}

/// Captions sorted into insertion order with their canvas-space anchors.
pub fn captions_in_order(
    canvas: &CanvasState,
    query: &Query<(Entity, &Transform, &Caption)>,
) -> Vec<(Entity, Vec2, String, f32, Color, FontWeight, u64)> {
    let mut list: Vec<_> = query
        .iter()
        .map(|(entity, transform, caption)| {
            (
                entity,
                canvas.canvas_from_world(transform.translation.truncate()),
                caption.text.clone(),
                caption.font_size,
                caption.color,
                caption.weight,
                caption.index,
            )
        })
        .collect();
    list.sort_by_key(|entry| entry.6);
    list
}

pub fn handle_add_caption(
    mut commands: Commands,
    mut events: MessageReader<AddCaptionRequest>,
    mut counter: ResMut<CaptionCounter>,
    settings: Res<CaptionSettings>,
    canvas: Res<CanvasState>,
    existing: Query<(), With<Caption>>,
    mut notices: MessageWriter<Notice>,
) {
    // Spawns are deferred through Commands, so captions added earlier in
    // this batch are not visible in the query yet
    let mut added_this_batch = 0;

    for event in events.read() {
        if !is_valid_caption_text(&event.text) {
            notices.write(Notice {
                text: "Enter some text before adding a caption.".to_string(),
                level: NoticeLevel::Error,
            });
            continue;
        }

        if !canvas.has_image() {
            debug!("Ignoring caption add with no image loaded");
            continue;
        }

        let anchor = default_anchor(existing.iter().count() + added_this_batch);
        let world = canvas.world_from_canvas(anchor);

        // Captions are single-line; collapse any pasted newlines
        let text = event.text.replace(['\n', '\r'], " ").trim().to_string();

        commands.spawn((
            Caption {
                text,
                font_size: settings.font_size,
                color: settings.color,
                weight: settings.weight,
                index: counter.next,
            },
            Transform::from_translation(world.extend(1.0)),
        ));
        counter.next += 1;
        added_this_batch += 1;
    }
}

pub fn handle_remove_caption(
    mut commands: Commands,
    mut events: MessageReader<RemoveCaptionRequest>,
) {
    for event in events.read() {
        // No-op if the entity is already gone
        if let Ok(mut entity) = commands.get_entity(event.entity) {
            entity.despawn();
        }
    }
}

/// Despawn every caption. Used when the base image is replaced.
pub fn clear_captions(commands: &mut Commands, captions: &Query<Entity, With<Caption>>) {
    for entity in captions.iter() {
        commands.entity(entity).despawn();
    }
}

/// Draw captions over the canvas with the egui painter.
///
/// Each caption is stroked in black (an offset ring under the fill) and
/// then filled in its own color, centered horizontally on the anchor with
/// the baseline at the anchor's y.
pub fn render_captions(
    mut contexts: EguiContexts,
    camera_query: Query<(&Camera, &GlobalTransform), With<EditorCamera>>,
    canvas: Res<CanvasState>,
    fonts: Res<CaptionFonts>,
    captions: Query<(Entity, &Transform, &Caption)>,
) -> Result {
    if !canvas.has_image() {
        return Ok(());
    }

    let ctx = contexts.ctx_mut()?;
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return Ok(());
    };

    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Background,
        egui::Id::new("caption_overlay"),
    ));

    for (_, canvas_anchor, text, font_size, color, weight, _) in
        captions_in_order(&canvas, &captions)
    {
        if text.is_empty() {
            continue;
        }

        let world = canvas.world_from_canvas(canvas_anchor);
        let Ok(screen) = camera.world_to_viewport(camera_transform, world.extend(0.0)) else {
            continue;
        };

        // Bottom-aligned galleys end a descent below the baseline; push
        // the draw position down so the baseline lands on the anchor,
        // matching the export rasterizer.
        let drop = fonts.baseline_drop(weight, font_size);
        let pos = egui::pos2(screen.x, screen.y + drop);
        let font_id = egui::FontId::new(font_size, fonts.egui_family(weight));
        let fill = theme::egui_color(color);

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
            painter.text(
                pos + egui::vec2(dx, dy),
                egui::Align2::CENTER_BOTTOM,
                &text,
                font_id.clone(),
                egui::Color32::BLACK,
            );
        }
        painter.text(pos, egui::Align2::CENTER_BOTTOM, &text, font_id, fill);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::{RunSystemOnce, SystemState};

    fn caption_world(display: Vec2) -> World {
        let mut world = World::new();
        world.init_resource::<Messages<AddCaptionRequest>>();
        world.init_resource::<Messages<Notice>>();
        world.init_resource::<CaptionCounter>();
        world.init_resource::<CaptionSettings>();
        world.insert_resource(CanvasState {
            source: Some(image::RgbaImage::new(10, 10)),
            display,
            sprite: None,
        });
        world
    }

    fn canvas_anchors(world: &mut World) -> Vec<Vec2> {
        let display = world.resource::<CanvasState>().display;
        let canvas = CanvasState {
            source: None,
            display,
            sprite: None,
        };
        let mut captions: Vec<(u64, Vec2)> = world
            .query::<(&Transform, &Caption)>()
            .iter(world)
            .map(|(transform, caption)| {
                (
                    caption.index,
                    canvas.canvas_from_world(transform.translation.truncate()),
                )
            })
            .collect();
        captions.sort_by_key(|(index, _)| *index);
        captions.into_iter().map(|(_, anchor)| anchor).collect()
    }

    #[test]
    fn test_empty_and_whitespace_text_is_rejected() {
        assert!(!is_valid_caption_text(""));
        assert!(!is_valid_caption_text("   "));
        assert!(!is_valid_caption_text("\n\t"));
        assert!(is_valid_caption_text("LOL"));
        assert!(is_valid_caption_text("  spaced  "));
    }

    #[test]
    fn test_default_anchor_stacks_vertically() {
        assert_eq!(default_anchor(0), Vec2::new(50.0, 50.0));
        assert_eq!(default_anchor(1), Vec2::new(50.0, 110.0));
        assert_eq!(default_anchor(4), Vec2::new(50.0, 290.0));
    }

    #[test]
    fn test_settings_default_matches_new_caption_style() {
        let settings = CaptionSettings::default();
        assert_eq!(settings.font_size, 32.0);
        assert_eq!(settings.weight, FontWeight::Bold);
        assert_eq!(settings.color, theme::CAPTION_DEFAULT);
    }

    #[test]
    fn test_adds_in_one_batch_stack_vertically() {
        let mut world = caption_world(Vec2::new(600.0, 400.0));
        {
            let mut requests = world.resource_mut::<Messages<AddCaptionRequest>>();
            requests.write(AddCaptionRequest {
                text: "TOP".to_string(),
            });
            requests.write(AddCaptionRequest {
                text: "   ".to_string(),
            });
            requests.write(AddCaptionRequest {
                text: "BOTTOM".to_string(),
            });
        }
        world.run_system_once(handle_add_caption).unwrap();

        // Rejected text does not advance the stacking position
        assert_eq!(
            canvas_anchors(&mut world),
            vec![Vec2::new(50.0, 50.0), Vec2::new(50.0, 110.0)]
        );
    }

    #[test]
    fn test_clear_captions_despawns_everything() {
        let mut world = World::new();
        for index in 0..3u64 {
            world.spawn((
                Caption {
                    text: format!("caption {index}"),
                    font_size: 32.0,
                    color: theme::CAPTION_DEFAULT,
                    weight: FontWeight::Bold,
                    index,
                },
                Transform::default(),
            ));
        }

        let mut state: SystemState<(Commands, Query<Entity, With<Caption>>)> =
            SystemState::new(&mut world);
        let (mut commands, captions) = state.get_mut(&mut world);
        clear_captions(&mut commands, &captions);
        state.apply(&mut world);

        let remaining = world
            .query_filtered::<Entity, With<Caption>>()
            .iter(&world)
            .count();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_counter_indices_are_unique() {
        let mut counter = CaptionCounter::default();
        let a = counter.next;
        counter.next += 1;
        let b = counter.next;
        counter.next += 1;
        assert_ne!(a, b);
        assert!(b > a);
    }
}
