//! Left control panel: upload, caption entry, caption list, and settings.

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use bevy_egui::{egui, EguiContexts};
use futures_lite::future;
use std::path::PathBuf;

use crate::config::{AppConfig, SetExportDirRequest};
use crate::editor::{
    AddCaptionRequest, Caption, CanvasState, CaptionSettings, RemoveCaptionRequest,
};
use crate::editor::captions::{is_valid_caption_text, FontWeight};
use crate::import::{ImportState, PickImageRequest};
use crate::theme;

#[derive(Resource, Default)]
pub struct ControlPanelState {
    pub caption_input: String,
    /// Pending export-directory chooser, if one is open
    pub pending_export_dir: Option<Task<Option<PathBuf>>>,
}

#[allow(clippy::too_many_arguments)]
pub fn control_panel_ui(
    mut contexts: EguiContexts,
    mut state: ResMut<ControlPanelState>,
    canvas: Res<CanvasState>,
    import: Res<ImportState>,
    mut settings: ResMut<CaptionSettings>,
    config: Res<AppConfig>,
    captions: Query<(Entity, &Caption)>,
    mut pick_events: MessageWriter<PickImageRequest>,
    mut add_events: MessageWriter<AddCaptionRequest>,
    mut remove_events: MessageWriter<RemoveCaptionRequest>,
    mut export_dir_events: MessageWriter<SetExportDirRequest>,
) -> Result {
    // Poll the pending folder chooser before drawing
    if let Some(ref mut task) = state.pending_export_dir
        && let Some(result) = future::block_on(future::poll_once(task))
    {
        state.pending_export_dir = None;
        if let Some(path) = result {
            export_dir_events.write(SetExportDirRequest { path: Some(path) });
        }
    }

    let mut should_browse_export_dir = false;

    egui::SidePanel::left("control_panel")
        .default_width(280.0)
        .show(contexts.ctx_mut()?, |ui| {
            ui.add_space(8.0);
            ui.label(egui::RichText::new("Image").strong());
            ui.add_space(4.0);

            if ui
                .add_enabled(
                    !import.is_picking(),
                    egui::Button::new("Choose Image...").min_size(egui::vec2(ui.available_width(), 32.0)),
                )
                .clicked()
            {
                pick_events.write(PickImageRequest);
            }
            ui.label(
                egui::RichText::new("PNG, JPG, WEBP, GIF or BMP up to 5 MB")
                    .weak()
                    .small(),
            );

            if canvas.has_image() {
                ui.add_space(8.0);
                ui.separator();
                ui.label(egui::RichText::new("Add Text").strong());
                ui.add_space(4.0);

                ui.add(
                    egui::TextEdit::singleline(&mut state.caption_input)
                        .hint_text("Type your caption...")
                        .desired_width(f32::INFINITY),
                );

                if ui
                    .add(egui::Button::new("Add Caption").min_size(egui::vec2(ui.available_width(), 28.0)))
                    .clicked()
                {
                    add_events.write(AddCaptionRequest {
                        text: state.caption_input.clone(),
                    });
                    if is_valid_caption_text(&state.caption_input) {
                        state.caption_input.clear();
                    }
                }

                ui.add_space(8.0);
                caption_settings_ui(ui, &mut settings);
            }

            let mut list: Vec<_> = captions.iter().collect();
            if !list.is_empty() {
                list.sort_by_key(|(_, caption)| caption.index);

                ui.add_space(8.0);
                ui.separator();
                ui.label(egui::RichText::new("Captions").strong());
                ui.add_space(4.0);

                egui::ScrollArea::vertical().max_height(160.0).show(ui, |ui| {
                    for (entity, caption) in list {
                        ui.horizontal(|ui| {
                            ui.label(truncate_caption(&caption.text, 24));
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    if ui.small_button("✕").on_hover_text("Delete").clicked() {
                                        remove_events.write(RemoveCaptionRequest { entity });
                                    }
                                },
                            );
                        });
                    }
                });
            }

            ui.add_space(8.0);
            ui.separator();
            egui::CollapsingHeader::new("Settings")
                .default_open(false)
                .show(ui, |ui| {
                    ui.label(
                        egui::RichText::new(format!(
                            "Exports go to: {}",
                            config.export_dir().display()
                        ))
                        .weak()
                        .small(),
                    );
                    ui.horizontal(|ui| {
                        if ui.button("Browse...").clicked() && state.pending_export_dir.is_none() {
                            should_browse_export_dir = true;
                        }
                        if ui.button("Reset").clicked() {
                            export_dir_events.write(SetExportDirRequest { path: None });
                        }
                    });
                });
        });

    // Spawn the folder chooser outside the panel closure
    if should_browse_export_dir {
        let task_pool = AsyncComputeTaskPool::get();
        state.pending_export_dir = Some(task_pool.spawn(async {
            rfd::AsyncFileDialog::new()
                .set_title("Choose Export Folder")
                .pick_folder()
                .await
                .map(|h| h.path().to_path_buf())
        }));
    }

    Ok(())
}

fn caption_settings_ui(ui: &mut egui::Ui, settings: &mut CaptionSettings) {
    ui.horizontal(|ui| {
        ui.label("Size:");
        ui.add(egui::Slider::new(&mut settings.font_size, 12.0..=96.0).suffix("px"));
    });

    ui.horizontal(|ui| {
        ui.label("Color:");
        for (color, name, swatch) in theme::caption_colors() {
            let selected = settings.color == color;
            let button = egui::Button::new("  ")
                .fill(swatch)
                .stroke(if selected {
                    egui::Stroke::new(2.0, egui::Color32::LIGHT_BLUE)
                } else {
                    egui::Stroke::new(1.0, egui::Color32::DARK_GRAY)
                });
            if ui.add(button).on_hover_text(name).clicked() {
                settings.color = color;
            }
        }
    });

    ui.horizontal(|ui| {
        ui.label("Weight:");
        for weight in [FontWeight::Bold, FontWeight::Normal] {
            if ui
                .selectable_label(settings.weight == weight, weight.display_name())
                .clicked()
            {
                settings.weight = weight;
            }
        }
    });
}

fn truncate_caption(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let truncated: String = flat.chars().take(max_chars).collect();
        format!("{}…", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_caption("LOL", 24), "LOL");
    }

    #[test]
    fn test_truncate_long_text_adds_ellipsis() {
        let long = "a".repeat(40);
        let shown = truncate_caption(&long, 24);
        assert_eq!(shown.chars().count(), 25);
        assert!(shown.ends_with('…'));
    }

    #[test]
    fn test_truncate_flattens_newlines() {
        assert_eq!(truncate_caption("top\nbottom", 24), "top bottom");
    }
}
