//! Export pipeline and the session gallery.
//!
//! Exporting flattens the canvas (see `compose`), prepends the PNG to the
//! gallery (newest first), and writes `meme-<timestamp>.png` to the export
//! directory on the IO task pool. Gallery entries can be re-saved under
//! their gallery name or handed to the system opener for sharing. The
//! gallery is append-only for the session.

use bevy::prelude::*;
use bevy::tasks::{IoTaskPool, Task};
use bevy_egui::{egui, EguiTextureHandle, EguiUserTextures};
use futures_lite::future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::compose::{self, CaptionDraw};
use crate::config::AppConfig;
use crate::editor::canvas::make_canvas_texture;
use crate::editor::captions::captions_in_order;
use crate::editor::{Caption, CanvasState};
use crate::fonts::CaptionFonts;
use crate::ui::notices::{Notice, NoticeLevel};

/// One exported meme, newest entries first in `Gallery::entries`
pub struct GalleryEntry {
    pub png: Arc<Vec<u8>>,
    /// Where the export was written (or will be, once the write lands)
    pub path: PathBuf,
    pub written: bool,
    /// Strong handle keeping the thumbnail texture alive
    pub thumb_handle: Handle<Image>,
    pub texture_id: egui::TextureId,
    pub size: (u32, u32),
}

#[derive(Resource, Default)]
pub struct Gallery {
    pub entries: Vec<GalleryEntry>,
    pub panel_open: bool,
}

/// Flatten the canvas, add it to the gallery, and save it to disk
#[derive(Message)]
pub struct ExportRequest;

/// Flatten the canvas and hand the file to the system opener
#[derive(Message)]
pub struct ShareCurrentRequest;

/// Re-save a gallery entry as `meme-gallery-<index+1>.png`
#[derive(Message)]
pub struct SaveEntryRequest {
    pub index: usize,
}

/// Share a gallery entry via the system opener
#[derive(Message)]
pub struct ShareEntryRequest {
    pub index: usize,
}

#[derive(Component)]
struct WriteTask {
    task: Task<Result<(), String>>,
    path: PathBuf,
    open_after: bool,
    success_notice: Option<String>,
}

/// Snapshot the canvas captions for compositing, in insertion order.
fn caption_draws(
    canvas: &CanvasState,
    captions: &Query<(Entity, &Transform, &Caption)>,
) -> Vec<CaptionDraw> {
    captions_in_order(canvas, captions)
        .into_iter()
        .map(|(_, anchor, text, font_size, color, weight, _)| CaptionDraw {
            text,
            anchor,
            font_size,
            color: compose::color_to_rgba8(color),
            weight,
        })
        .collect()
}

/// Flatten and PNG-encode the current canvas.
fn flatten_canvas(
    canvas: &CanvasState,
    captions: &Query<(Entity, &Transform, &Caption)>,
    fonts: &CaptionFonts,
) -> Result<(image::RgbaImage, Vec<u8>), String> {
    let source = canvas
        .source
        .as_ref()
        .ok_or_else(|| "Upload an image before exporting".to_string())?;
    let flattened = compose::flatten(
        source,
        canvas.display_pixels(),
        &caption_draws(canvas, captions),
        fonts,
    )?;
    let png = compose::encode_png(&flattened)?;
    Ok((flattened, png))
}

fn export_filename() -> String {
    export_filename_at(chrono::Local::now())
}

/// Millisecond precision keeps rapid back-to-back exports from
/// overwriting each other.
fn export_filename_at(timestamp: chrono::DateTime<chrono::Local>) -> String {
    format!("meme-{}.png", timestamp.format("%Y%m%d-%H%M%S-%3f"))
}

fn spawn_write_task(
    commands: &mut Commands,
    bytes: Arc<Vec<u8>>,
    path: PathBuf,
    open_after: bool,
    success_notice: Option<String>,
) {
    let task_path = path.clone();
    let task = IoTaskPool::get().spawn(async move {
        if let Some(parent) = task_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Could not create export directory: {}", e))?;
        }
        std::fs::write(&task_path, bytes.as_slice())
            .map_err(|e| format!("Could not write {:?}: {}", task_path, e))
    });
    commands.spawn(WriteTask {
        task,
        path,
        open_after,
        success_notice,
    });
}

/// Hand a file to the platform opener, degrading to a notice when no
/// handler is available. Never fatal.
fn open_with_system(path: &Path, notices: &mut MessageWriter<Notice>) {
    match open::that(path) {
        Ok(()) => {
            info!("Opened {:?} with the system handler", path);
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            notices.write(Notice {
                text: format!(
                    "No app available to share with. The meme is saved at {} — share it manually.",
                    path.display()
                ),
                level: NoticeLevel::Info,
            });
        }
        Err(e) => {
            warn!("Share of {:?} failed: {}", path, e);
            notices.write(Notice {
                text: format!("Could not share the meme: {}", e),
                level: NoticeLevel::Error,
            });
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_export(
    mut commands: Commands,
    mut events: MessageReader<ExportRequest>,
    canvas: Res<CanvasState>,
    captions: Query<(Entity, &Transform, &Caption)>,
    fonts: Res<CaptionFonts>,
    config: Res<AppConfig>,
    mut gallery: ResMut<Gallery>,
    mut images: ResMut<Assets<Image>>,
    mut egui_textures: ResMut<EguiUserTextures>,
    mut notices: MessageWriter<Notice>,
) {
    for _ in events.read() {
        let (flattened, png) = match flatten_canvas(&canvas, &captions, &fonts) {
            Ok(result) => result,
            Err(e) => {
                notices.write(Notice {
                    text: e,
                    level: NoticeLevel::Error,
                });
                continue;
            }
        };

        let path = config.export_dir().join(export_filename());
        let png = Arc::new(png);

        let thumb_handle = images.add(make_canvas_texture(&flattened));
        let texture_id = egui_textures.add_image(EguiTextureHandle::Weak(thumb_handle.id()));

        // Newest first
        gallery.entries.insert(
            0,
            GalleryEntry {
                png: png.clone(),
                path: path.clone(),
                written: false,
                thumb_handle,
                texture_id,
                size: flattened.dimensions(),
            },
        );

        spawn_write_task(
            &mut commands,
            png,
            path.clone(),
            false,
            Some(format!(
                "Meme saved to {} and added to the gallery.",
                path.display()
            )),
        );
    }
}

fn handle_share_current(
    mut commands: Commands,
    mut events: MessageReader<ShareCurrentRequest>,
    canvas: Res<CanvasState>,
    captions: Query<(Entity, &Transform, &Caption)>,
    fonts: Res<CaptionFonts>,
    config: Res<AppConfig>,
    mut notices: MessageWriter<Notice>,
) {
    for _ in events.read() {
        let (_, png) = match flatten_canvas(&canvas, &captions, &fonts) {
            Ok(result) => result,
            Err(e) => {
                notices.write(Notice {
                    text: e,
                    level: NoticeLevel::Error,
                });
                continue;
            }
        };

        let path = config.export_dir().join(export_filename());
        spawn_write_task(&mut commands, Arc::new(png), path, true, None);
    }
}

fn handle_save_entry(
    mut commands: Commands,
    mut events: MessageReader<SaveEntryRequest>,
    gallery: Res<Gallery>,
    config: Res<AppConfig>,
) {
    for event in events.read() {
        let Some(entry) = gallery.entries.get(event.index) else {
            warn!("Save requested for missing gallery entry {}", event.index);
            continue;
        };

        let name = format!("meme-gallery-{}.png", event.index + 1);
        let path = config.export_dir().join(&name);
        spawn_write_task(
            &mut commands,
            entry.png.clone(),
            path.clone(),
            false,
            Some(format!("Saved {}.", path.display())),
        );
    }
}

fn handle_share_entry(
    mut commands: Commands,
    mut events: MessageReader<ShareEntryRequest>,
    gallery: Res<Gallery>,
    mut notices: MessageWriter<Notice>,
) {
    for event in events.read() {
        let Some(entry) = gallery.entries.get(event.index) else {
            warn!("Share requested for missing gallery entry {}", event.index);
            continue;
        };

        if entry.written {
            open_with_system(&entry.path, &mut notices);
        } else {
            // Export write hasn't landed yet; write it again and open after
            spawn_write_task(
                &mut commands,
                entry.png.clone(),
                entry.path.clone(),
                true,
                None,
            );
        }
    }
}

fn poll_write_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut WriteTask)>,
    mut gallery: ResMut<Gallery>,
    mut notices: MessageWriter<Notice>,
) {
    for (entity, mut write) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut write.task)) else {
            continue;
        };

        match result {
            Ok(()) => {
                info!("Wrote {:?}", write.path);
                for entry in gallery.entries.iter_mut() {
                    if entry.path == write.path {
                        entry.written = true;
                    }
                }
                if let Some(ref text) = write.success_notice {
                    notices.write(Notice {
                        text: text.clone(),
                        level: NoticeLevel::Info,
                    });
                }
                if write.open_after {
                    open_with_system(&write.path, &mut notices);
                }
            }
            Err(e) => {
                error!("Write of {:?} failed: {}", write.path, e);
                notices.write(Notice {
                    text: e,
                    level: NoticeLevel::Error,
                });
            }
        }

        commands.entity(entity).despawn();
    }
}

pub struct GalleryPlugin;

impl Plugin for GalleryPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Gallery>()
            .add_message::<ExportRequest>()
            .add_message::<ShareCurrentRequest>()
            .add_message::<SaveEntryRequest>()
            .add_message::<ShareEntryRequest>()
            .add_systems(
                Update,
                (
                    handle_export.run_if(on_message::<ExportRequest>),
                    handle_share_current.run_if(on_message::<ShareCurrentRequest>),
                    handle_save_entry.run_if(on_message::<SaveEntryRequest>),
                    handle_share_entry.run_if(on_message::<ShareEntryRequest>),
                    poll_write_tasks,
                ),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_filename_shape() {
        let name = export_filename();
        assert!(name.starts_with("meme-"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_export_filenames_differ_within_one_second() {
        use chrono::TimeZone;

        let first = chrono::Local.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let second = chrono::Local.timestamp_millis_opt(1_700_000_000_456).unwrap();
        assert_ne!(export_filename_at(first), export_filename_at(second));
    }

    #[test]
    fn test_gallery_prepend_keeps_newest_first() {
        // The prepend-at-zero ordering contract, exercised on the
        // underlying Vec the same way handle_export inserts.
        let mut entries: Vec<u32> = Vec::new();
        entries.insert(0, 1);
        entries.insert(0, 2);
        assert_eq!(entries, vec![2, 1]);
    }

    #[test]
    fn test_gallery_save_names_are_one_based() {
        for (index, expected) in [(0, "meme-gallery-1.png"), (4, "meme-gallery-5.png")] {
            assert_eq!(format!("meme-gallery-{}.png", index + 1), expected);
        }
    }
}
