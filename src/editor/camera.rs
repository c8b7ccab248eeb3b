use bevy::prelude::*;

#[derive(Component)]
pub struct EditorCamera;

/// Fixed 2D camera centered on the canvas; the editor has no pan or zoom.
pub fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        EditorCamera,
        Transform::from_translation(Vec3::new(0.0, 0.0, 1000.0)),
    ));
}
