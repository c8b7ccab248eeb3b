pub mod control_panel;
pub mod gallery_panel;
pub mod notices;
pub mod toolbar;

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};

use crate::config::ConfigResetNotification;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<control_panel::ControlPanelState>()
            .init_resource::<notices::ActiveNotices>()
            .add_message::<notices::Notice>()
            .add_systems(Update, notices::collect_notices)
            .add_systems(
                EguiPrimaryContextPass,
                (
                    control_panel::control_panel_ui,
                    toolbar::toolbar_ui,
                    gallery_panel::gallery_panel_ui,
                    toolbar::canvas_placeholder_ui,
                    config_reset_dialog_ui,
                    notices::render_notices,
                )
                    .chain(),
            );
    }
}

/// Modal shown once when the config file could not be read and was reset.
fn config_reset_dialog_ui(
    mut contexts: EguiContexts,
    mut notification: ResMut<ConfigResetNotification>,
) -> Result {
    if !notification.show {
        return Ok(());
    }

    let mut dismissed = false;
    egui::Window::new("Settings Reset")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("Your settings file could not be read and has been reset to defaults.");
            if let Some(reason) = &notification.reason {
                ui.add_space(4.0);
                ui.label(egui::RichText::new(reason).weak().small());
            }
            ui.add_space(8.0);
            ui.vertical_centered(|ui| {
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        });

    if dismissed {
        notification.show = false;
    }

    Ok(())
}
