//! Image upload: file picking, size validation, and async decode.
//!
//! Decoding happens off the main thread. Every load is tagged with a
//! generation number; a completion that arrives after a newer load has
//! started is stale and gets discarded, so the newest upload always wins.

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, IoTaskPool, Task};
use futures_lite::future;
use image::RgbaImage;
use std::path::PathBuf;

use crate::config::{AppConfig, SetLastImageDirRequest};
use crate::constants::MAX_UPLOAD_BYTES;
use crate::editor::captions::clear_captions;
use crate::editor::canvas::{display_size, make_canvas_texture};
use crate::editor::{Caption, CanvasSprite, CanvasState};
use crate::ui::notices::{Notice, NoticeLevel};

/// Message to open the image picker
#[derive(Message)]
pub struct PickImageRequest;

/// Pending file dialog, if one is open
#[derive(Resource, Default)]
pub struct ImportState {
    pub pending_pick: Option<Task<Option<PathBuf>>>,
}

impl ImportState {
    pub fn is_picking(&self) -> bool {
        self.pending_pick.is_some()
    }
}

/// Generation counter closing the superseding-load race: only the decode
/// completion matching the current generation is applied.
#[derive(Resource, Default)]
pub struct LoadGeneration {
    pub current: u64,
}

struct DecodeResult {
    generation: u64,
    path: PathBuf,
    result: Result<RgbaImage, String>,
}

#[derive(Component)]
struct DecodeTask(Task<DecodeResult>);

fn handle_pick_request(
    mut events: MessageReader<PickImageRequest>,
    mut state: ResMut<ImportState>,
    config: Res<AppConfig>,
) {
    for _ in events.read() {
        if state.pending_pick.is_some() {
            continue;
        }

        let mut dialog = rfd::AsyncFileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "webp", "gif", "bmp"])
            .set_title("Choose an image");
        if let Some(ref dir) = config.data.last_image_dir {
            dialog = dialog.set_directory(dir);
        }

        let task_pool = AsyncComputeTaskPool::get();
        state.pending_pick = Some(
            task_pool.spawn(async move { dialog.pick_file().await.map(|h| h.path().to_path_buf()) }),
        );
    }
}

fn poll_pick(
    mut commands: Commands,
    mut state: ResMut<ImportState>,
    mut generation: ResMut<LoadGeneration>,
    mut config_events: MessageWriter<SetLastImageDirRequest>,
    mut notices: MessageWriter<Notice>,
) {
    let Some(ref mut task) = state.pending_pick else {
        return;
    };
    let Some(picked) = future::block_on(future::poll_once(task)) else {
        return;
    };
    state.pending_pick = None;

    let Some(path) = picked else {
        return; // dialog cancelled
    };

    match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_UPLOAD_BYTES => {
            notices.write(Notice {
                text: "That image is over 5 MB. Please choose a smaller one.".to_string(),
                level: NoticeLevel::Error,
            });
            return;
        }
        Err(e) => {
            notices.write(Notice {
                text: format!("Could not read the selected file: {}", e),
                level: NoticeLevel::Error,
            });
            return;
        }
        Ok(_) => {}
    }

    if let Some(parent) = path.parent() {
        config_events.write(SetLastImageDirRequest {
            path: parent.to_path_buf(),
        });
    }

    generation.current += 1;
    let load_generation = generation.current;
    info!("Decoding {:?} (generation {})", path, load_generation);

    let task_pool = IoTaskPool::get();
    let task = task_pool.spawn(async move {
        let result = image::open(&path)
            .map(|img| img.to_rgba8())
            .map_err(|e| format!("Could not decode image: {}", e));
        DecodeResult {
            generation: load_generation,
            path,
            result,
        }
    });
    commands.spawn(DecodeTask(task));
}

#[allow(clippy::too_many_arguments)]
fn poll_decode(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut DecodeTask)>,
    generation: Res<LoadGeneration>,
    mut canvas: ResMut<CanvasState>,
    mut images: ResMut<Assets<Image>>,
    captions: Query<Entity, With<Caption>>,
    mut notices: MessageWriter<Notice>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(done) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        commands.entity(entity).despawn();

        if done.generation != generation.current {
            debug!(
                "Discarding stale decode of {:?} (generation {} < {})",
                done.path, done.generation, generation.current
            );
            continue;
        }

        let rgba = match done.result {
            Ok(rgba) => rgba,
            Err(e) => {
                warn!("Decode of {:?} failed: {}", done.path, e);
                notices.write(Notice {
                    text: e,
                    level: NoticeLevel::Error,
                });
                continue;
            }
        };

        let display_dims = display_size(rgba.width(), rgba.height());
        let handle = images.add(make_canvas_texture(&rgba));

        // Replace the background sprite and drop every caption
        if let Some(old) = canvas.sprite.take() {
            if let Ok(mut sprite) = commands.get_entity(old) {
                sprite.despawn();
            }
        }
        clear_captions(&mut commands, &captions);

        let sprite = commands
            .spawn((
                Sprite {
                    custom_size: Some(display_dims),
                    ..Sprite::from_image(handle)
                },
                Transform::from_translation(Vec3::ZERO),
                CanvasSprite,
            ))
            .id();

        canvas.source = Some(rgba);
        canvas.display = display_dims;
        canvas.sprite = Some(sprite);
        info!(
            "Loaded {:?}: displaying at {}x{}",
            done.path, display_dims.x, display_dims.y
        );
    }
}

pub struct ImportPlugin;

impl Plugin for ImportPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ImportState>()
            .init_resource::<LoadGeneration>()
            .add_message::<PickImageRequest>()
            .add_systems(
                Update,
                (
                    handle_pick_request.run_if(on_message::<PickImageRequest>),
                    poll_pick,
                    poll_decode,
                ),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_generation_is_detected() {
        let generation = LoadGeneration { current: 3 };
        let stale = DecodeResult {
            generation: 2,
            path: PathBuf::from("old.png"),
            result: Err(String::new()),
        };
        let fresh = DecodeResult {
            generation: 3,
            path: PathBuf::from("new.png"),
            result: Err(String::new()),
        };
        assert_ne!(stale.generation, generation.current);
        assert_eq!(fresh.generation, generation.current);
    }

    #[test]
    fn test_upload_limit_is_five_megabytes() {
        assert_eq!(MAX_UPLOAD_BYTES, 5 * 1024 * 1024);
    }
}
