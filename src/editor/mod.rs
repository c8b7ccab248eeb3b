mod camera;
pub mod canvas;
pub mod captions;
mod drag;
pub mod hit_testing;
pub mod params;

pub use camera::EditorCamera;
pub use canvas::{CanvasSprite, CanvasState};
pub use captions::{
    AddCaptionRequest, Caption, CaptionCounter, CaptionSettings, RemoveCaptionRequest,
};
pub use drag::DragState;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

pub struct EditorPlugin;

impl Plugin for EditorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CanvasState>()
            .init_resource::<CaptionCounter>()
            .init_resource::<CaptionSettings>()
            .init_resource::<DragState>()
            .add_message::<AddCaptionRequest>()
            .add_message::<RemoveCaptionRequest>()
            .add_systems(Startup, camera::spawn_camera)
            .add_systems(
                Update,
                (
                    captions::handle_add_caption.run_if(on_message::<AddCaptionRequest>),
                    captions::handle_remove_caption.run_if(on_message::<RemoveCaptionRequest>),
                    drag::handle_drag,
                    drag::update_drag_cursor.after(drag::handle_drag),
                ),
            )
            .add_systems(EguiPrimaryContextPass, captions::render_captions);
    }
}
