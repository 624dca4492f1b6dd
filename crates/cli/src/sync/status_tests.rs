// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

fn snapshot(
    is_online: bool,
    is_syncing: bool,
    pending_count: usize,
    update_available: bool,
) -> StatusSnapshot {
    StatusSnapshot {
        is_online,
        is_syncing,
        pending_count,
        failed_count: 0,
        update_available,
    }
}

#[parameterized(
    offline_idle = { snapshot(false, false, 0, false), Banner::Offline { pending: 0 } },
    offline_beats_update = { snapshot(false, false, 0, true), Banner::Offline { pending: 0 } },
    offline_beats_pending = { snapshot(false, false, 4, true), Banner::Offline { pending: 4 } },
    offline_beats_syncing = { snapshot(false, true, 2, false), Banner::Offline { pending: 2 } },
    syncing_beats_pending = { snapshot(true, true, 3, false), Banner::Syncing },
    syncing_beats_update = { snapshot(true, true, 0, true), Banner::Syncing },
    pending_beats_update = { snapshot(true, false, 1, true), Banner::Pending { count: 1 } },
    update_when_idle_and_empty = { snapshot(true, false, 0, true), Banner::UpdateAvailable },
    hidden_when_nothing_to_say = { snapshot(true, false, 0, false), Banner::Hidden },
)]
fn banner_priority(status: StatusSnapshot, expected: Banner) {
    assert_eq!(select_banner(&status), expected);
}

#[test]
fn failed_count_never_changes_selection() {
    let mut status = snapshot(true, false, 0, false);
    status.failed_count = 5;
    assert_eq!(select_banner(&status), Banner::Hidden);
}

#[parameterized(
    offline_empty = { Banner::Offline { pending: 0 }, "offline: changes will be queued" },
    offline_one = { Banner::Offline { pending: 1 }, "offline: 1 change queued" },
    offline_many = { Banner::Offline { pending: 3 }, "offline: 3 changes queued" },
    syncing = { Banner::Syncing, "syncing queued changes..." },
    pending = { Banner::Pending { count: 2 }, "2 changes waiting to sync" },
    update = { Banner::UpdateAvailable, "update available: restart to apply" },
    hidden = { Banner::Hidden, "all changes synced" },
)]
fn banner_text(banner: Banner, expected: &str) {
    assert_eq!(banner.to_string(), expected);
    assert_eq!(banner.render(false), expected);
}

#[test]
fn render_colors_visible_banners_only() {
    assert!(Banner::Syncing.render(true).starts_with("\x1b[38;5;"));
    assert_eq!(Banner::Hidden.render(true), "all changes synced");
    assert!(!Banner::Hidden.is_visible());
    assert!(Banner::UpdateAvailable.is_visible());
}

#[test]
fn status_line_appends_failed_count() {
    let mut status = snapshot(true, false, 2, false);
    status.failed_count = 1;
    assert_eq!(
        status_line(&status, false),
        "2 changes waiting to sync (1 failed)"
    );

    status.pending_count = 0;
    assert_eq!(status_line(&status, false), "all changes synced (1 failed)");
}

#[test]
fn status_line_keeps_offline_and_syncing_plain() {
    let mut status = snapshot(false, false, 2, false);
    status.failed_count = 1;
    assert_eq!(status_line(&status, false), "offline: 2 changes queued");

    let mut status = snapshot(true, true, 2, false);
    status.failed_count = 1;
    assert_eq!(status_line(&status, false), "syncing queued changes...");
}

#[test]
fn binding_yields_only_on_change() {
    let mut binding = StatusBinding::default();
    let offline = snapshot(false, false, 1, false);

    assert_eq!(binding.update(&offline), Some(Banner::Offline { pending: 1 }));
    assert_eq!(binding.update(&offline), None);

    let online = snapshot(true, true, 1, false);
    assert_eq!(binding.update(&online), Some(Banner::Syncing));
    assert_eq!(binding.current(), Some(Banner::Syncing));

    let done = snapshot(true, false, 0, false);
    assert_eq!(binding.update(&done), Some(Banner::Hidden));
    assert_eq!(binding.update(&done), None);
}

#[test]
fn binding_sees_count_changes_within_same_banner() {
    let mut binding = StatusBinding::default();
    binding.update(&snapshot(false, false, 1, false));
    assert_eq!(
        binding.update(&snapshot(false, false, 2, false)),
        Some(Banner::Offline { pending: 2 })
    );
}
