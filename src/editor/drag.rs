//! Drag state machine for captions.
//!
//! Idle -> Dragging on press over a caption hit box; the pointer-to-anchor
//! offset captured at press time is preserved through the drag so the
//! caption doesn't jump to the cursor. Release or the pointer leaving the
//! surface returns to Idle. While idle, hovering a hit box is tracked as a
//! bare boolean for cursor feedback.

use bevy::prelude::*;
use bevy::window::{CursorIcon, PrimaryWindow, SystemCursorIcon};
use bevy_egui::EguiContexts;

use super::canvas::CanvasState;
use super::captions::{captions_in_order, Caption};
use super::hit_testing::first_hit;
use super::params::{is_cursor_over_ui, CameraParams};

/// An in-progress caption drag
pub struct ActiveDrag {
    pub entity: Entity,
    /// Pointer position minus caption anchor at press time, canvas coords
    pub offset: Vec2,
}

#[derive(Resource, Default)]
pub struct DragState {
    pub dragging: Option<ActiveDrag>,
    /// True while the idle pointer is over a caption hit box
    pub hovering: bool,
}

pub fn handle_drag(
    mouse_button: Res<ButtonInput<MouseButton>>,
    camera: CameraParams,
    canvas: Res<CanvasState>,
    mut drag_state: ResMut<DragState>,
    mut contexts: EguiContexts,
    mut captions: ParamSet<(
        Query<(Entity, &Transform, &Caption)>,
        Query<&mut Transform, With<Caption>>,
    )>,
) {
    if !canvas.has_image() {
        drag_state.dragging = None;
        drag_state.hovering = false;
        return;
    }

    if mouse_button.just_released(MouseButton::Left) {
        drag_state.dragging = None;
    }

    // Pointer left the window or moved over UI: the surface lost it
    let pointer = camera.cursor_world_pos().map(|w| canvas.canvas_from_world(w));
    let over_ui = is_cursor_over_ui(&mut contexts);
    let Some(point) = pointer.filter(|_| !over_ui) else {
        drag_state.dragging = None;
        drag_state.hovering = false;
        return;
    };

    match drag_state.dragging {
        Some(ref drag) => {
            if mouse_button.pressed(MouseButton::Left) {
                let anchor = point - drag.offset;
                if let Ok(mut transform) = captions.p1().get_mut(drag.entity) {
                    let world = canvas.world_from_canvas(anchor);
                    transform.translation.x = world.x;
                    transform.translation.y = world.y;
                } else {
                    // Caption was deleted mid-drag
                    drag_state.dragging = None;
                }
            } else {
                drag_state.dragging = None;
            }
        }
        None => {
            let ordered = captions_in_order(&canvas, &captions.p0());
            let hit = first_hit(
                point,
                ordered
                    .iter()
                    .map(|(entity, anchor, text, size, _, _, _)| {
                        (*entity, *anchor, text.as_str(), *size)
                    }),
            );

            drag_state.hovering = hit.is_some();

            if mouse_button.just_pressed(MouseButton::Left)
                && let Some(entity) = hit
            {
                let anchor = ordered
                    .iter()
                    .find(|(e, ..)| *e == entity)
                    .map(|(_, anchor, ..)| *anchor)
                    .unwrap_or(point);
                drag_state.dragging = Some(ActiveDrag {
                    entity,
                    offset: point - anchor,
                });
                drag_state.hovering = false;
            }
        }
    }
}

/// Set the window cursor from the drag state: grabbing while dragging,
/// grab over a hit box, default otherwise.
pub fn update_drag_cursor(
    window_query: Query<Entity, With<PrimaryWindow>>,
    drag_state: Res<DragState>,
    mut commands: Commands,
    mut contexts: EguiContexts,
) {
    let Ok(window_entity) = window_query.single() else {
        return;
    };

    let icon = if drag_state.dragging.is_some() {
        SystemCursorIcon::Grabbing
    } else if drag_state.hovering && !is_cursor_over_ui(&mut contexts) {
        SystemCursorIcon::Grab
    } else {
        SystemCursorIcon::Default
    };

    commands
        .entity(window_entity)
        .insert(CursorIcon::System(icon));
}

#[cfg(test)]
mod tests {
    use super::*;

    // Drag arithmetic: press at offset (dx, dy) from the anchor, move to P,
    // and the anchor lands at P - (dx, dy).
    #[test]
    fn test_drag_preserves_press_offset() {
        let anchor = Vec2::new(100.0, 80.0);
        let press = Vec2::new(110.0, 72.0);
        let offset = press - anchor;

        let moved_to = Vec2::new(250.0, 140.0);
        let new_anchor = moved_to - offset;
        assert_eq!(new_anchor, Vec2::new(240.0, 148.0));
    }

    #[test]
    fn test_drag_offset_zero_when_pressed_on_anchor() {
        let anchor = Vec2::new(50.0, 50.0);
        let offset = anchor - anchor;
        let new_anchor = Vec2::new(300.0, 10.0) - offset;
        assert_eq!(new_anchor, Vec2::new(300.0, 10.0));
    }
}
