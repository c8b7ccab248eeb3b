use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::editor::CanvasState;
use crate::gallery::{ExportRequest, Gallery, ShareCurrentRequest};

/// Main toolbar: export/share actions and the gallery toggle
pub fn toolbar_ui(
    mut contexts: EguiContexts,
    canvas: Res<CanvasState>,
    mut gallery: ResMut<Gallery>,
    mut export_events: MessageWriter<ExportRequest>,
    mut share_events: MessageWriter<ShareCurrentRequest>,
) -> Result {
    egui::TopBottomPanel::top("main_toolbar")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 8)),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 6.0;

                ui.label(egui::RichText::new("Memeforge").size(16.0).strong());

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                let can_export = canvas.has_image();
                if ui
                    .add_enabled(
                        can_export,
                        egui::Button::new("Export").min_size(egui::vec2(0.0, 28.0)),
                    )
                    .on_hover_text("Flatten the canvas and save it as a PNG")
                    .clicked()
                {
                    export_events.write(ExportRequest);
                }

                if ui
                    .add_enabled(
                        can_export,
                        egui::Button::new("Share").min_size(egui::vec2(0.0, 28.0)),
                    )
                    .on_hover_text("Flatten the canvas and hand it to the system share handler")
                    .clicked()
                {
                    share_events.write(ShareCurrentRequest);
                }

                // Right-aligned gallery toggle
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = if gallery.panel_open {
                        format!("Hide Gallery ({})", gallery.entries.len())
                    } else {
                        format!("Gallery ({})", gallery.entries.len())
                    };
                    if ui
                        .add(egui::Button::new(label).min_size(egui::vec2(0.0, 28.0)))
                        .clicked()
                    {
                        gallery.panel_open = !gallery.panel_open;
                    }
                });
            });
        });

    Ok(())
}

/// Centered hint shown while no image is loaded
pub fn canvas_placeholder_ui(mut contexts: EguiContexts, canvas: Res<CanvasState>) -> Result {
    if canvas.has_image() {
        return Ok(());
    }

    egui::Area::new(egui::Id::new("canvas_placeholder"))
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .interactable(false)
        .show(contexts.ctx_mut()?, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(
                    egui::RichText::new("Upload an image to get started")
                        .size(20.0)
                        .weak(),
                );
            });
        });

    Ok(())
}
