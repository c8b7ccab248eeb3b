//! Toast notices.
//!
//! Every user-facing failure (oversized upload, empty caption text, share
//! trouble) and a few confirmations surface here. Notices stack in the
//! bottom-right corner and expire after a few seconds; nothing is fatal.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::constants::NOTICE_LIFETIME_SECS;
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Message to surface a toast to the user
#[derive(Message, Clone)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
}

struct ActiveNotice {
    text: String,
    level: NoticeLevel,
    expires_at: f64,
}

#[derive(Resource, Default)]
pub struct ActiveNotices {
    items: Vec<ActiveNotice>,
}

impl ActiveNotices {
    pub fn count(&self) -> usize {
        self.items.len()
    }
}

/// Collect posted notices and stamp their expiry.
pub fn collect_notices(
    mut events: MessageReader<Notice>,
    mut active: ResMut<ActiveNotices>,
    time: Res<Time>,
) {
    for notice in events.read() {
        if notice.level == NoticeLevel::Error {
            warn!("Notice: {}", notice.text);
        } else {
            info!("Notice: {}", notice.text);
        }
        active.items.push(ActiveNotice {
            text: notice.text.clone(),
            level: notice.level,
            expires_at: time.elapsed_secs_f64() + NOTICE_LIFETIME_SECS,
        });
    }
}

/// Draw active notices stacked above the bottom-right corner.
pub fn render_notices(
    mut contexts: EguiContexts,
    mut active: ResMut<ActiveNotices>,
    time: Res<Time>,
) -> Result {
    let now = time.elapsed_secs_f64();
    active.items.retain(|n| n.expires_at > now);

    if active.items.is_empty() {
        return Ok(());
    }

    egui::Area::new(egui::Id::new("notices"))
        .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -12.0])
        .order(egui::Order::Foreground)
        .interactable(false)
        .show(contexts.ctx_mut()?, |ui| {
            for notice in active.items.iter() {
                let fill = match notice.level {
                    NoticeLevel::Info => theme::NOTICE_INFO_BG,
                    NoticeLevel::Error => theme::NOTICE_ERROR_BG,
                };
                egui::Frame::default()
                    .fill(fill)
                    .corner_radius(egui::CornerRadius::same(6))
                    .inner_margin(egui::Margin::symmetric(10, 8))
                    .show(ui, |ui| {
                        ui.set_max_width(320.0);
                        ui.colored_label(theme::NOTICE_TEXT, &notice.text);
                    });
                ui.add_space(4.0);
            }
        });

    Ok(())
}
