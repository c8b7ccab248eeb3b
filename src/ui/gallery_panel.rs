//! Bottom gallery strip of exported memes.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::constants::GALLERY_THUMBNAIL_SIZE;
use crate::editor::canvas::fit_within;
use crate::gallery::{Gallery, SaveEntryRequest, ShareEntryRequest};

pub fn gallery_panel_ui(
    mut contexts: EguiContexts,
    gallery: Res<Gallery>,
    mut save_events: MessageWriter<SaveEntryRequest>,
    mut share_events: MessageWriter<ShareEntryRequest>,
) -> Result {
    if !gallery.panel_open {
        return Ok(());
    }

    egui::TopBottomPanel::bottom("gallery_panel")
        .resizable(false)
        .show(contexts.ctx_mut()?, |ui| {
            ui.add_space(6.0);

            if gallery.entries.is_empty() {
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new("Nothing here yet. Export a meme to fill the gallery.")
                            .weak(),
                    );
                });
                ui.add_space(6.0);
                return;
            }

            egui::ScrollArea::horizontal().show(ui, |ui| {
                ui.horizontal(|ui| {
                    for (index, entry) in gallery.entries.iter().enumerate() {
                        ui.vertical(|ui| {
                            let thumb = fit_within(
                                entry.size.0,
                                entry.size.1,
                                GALLERY_THUMBNAIL_SIZE,
                                GALLERY_THUMBNAIL_SIZE,
                            );
                            ui.add(
                                egui::Image::new(egui::load::SizedTexture::new(
                                    entry.texture_id,
                                    egui::vec2(thumb.x, thumb.y),
                                ))
                                .corner_radius(egui::CornerRadius::same(4)),
                            );
                            ui.horizontal(|ui| {
                                ui.label(egui::RichText::new(format!("#{}", index + 1)).weak());
                                if ui.small_button("Save").clicked() {
                                    save_events.write(SaveEntryRequest { index });
                                }
                                if ui.small_button("Share").clicked() {
                                    share_events.write(ShareEntryRequest { index });
                                }
                            });
                        });
                        ui.add_space(6.0);
                    }
                });
            });

            ui.add_space(6.0);
        });

    Ok(())
}
