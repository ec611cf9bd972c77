// Tests for canvas overlay settings and the connection message display

use std::time::{Duration, Instant};

use patchlab::canvas::overlays::{EditorMode, OverlayError, OverlayKind, OverlayPopupSlot, OverlaySettings};
use patchlab::canvas::MessageDisplay;
use patchlab::config::Config;
use tempfile::TempDir;

#[test]
fn test_overlays_default_all_off() {
    let settings = OverlaySettings::default();

    for mode in EditorMode::ALL {
        for kind in OverlayKind::ALL {
            assert!(!settings.is_shown(mode, kind));
        }
        assert!(settings.shown_in(mode).is_empty());
    }
}

#[test]
fn test_overlay_toggles_are_per_mode() {
    let mut settings = OverlaySettings::default();

    settings.set(EditorMode::Edit, OverlayKind::Origin, true).unwrap();

    assert!(settings.is_shown(EditorMode::Edit, OverlayKind::Origin));
    assert!(!settings.is_shown(EditorMode::Lock, OverlayKind::Origin));
    assert!(!settings.is_shown(EditorMode::Run, OverlayKind::Origin));
    assert!(!settings.is_shown(EditorMode::Alt, OverlayKind::Origin));

    // Other overlays in the same mode are untouched
    assert!(!settings.is_shown(EditorMode::Edit, OverlayKind::Border));
    assert!(!settings.is_shown(EditorMode::Edit, OverlayKind::Index));
}

#[test]
fn test_object_overlays_unavailable_while_running() {
    let mut settings = OverlaySettings::default();

    for kind in [OverlayKind::Index, OverlayKind::Direction] {
        assert!(!kind.available_in(EditorMode::Run));
        let err = settings.set(EditorMode::Run, kind, true).unwrap_err();
        assert_eq!(
            err,
            OverlayError::NotAvailable {
                kind,
                mode: EditorMode::Run
            }
        );
        assert!(!settings.is_shown(EditorMode::Run, kind));
    }

    // Origin and Border stay available in every mode
    for mode in EditorMode::ALL {
        settings.set(mode, OverlayKind::Origin, true).unwrap();
        settings.set(mode, OverlayKind::Border, true).unwrap();
    }
}

#[test]
fn test_toggle_flips_and_reports_new_state() {
    let mut settings = OverlaySettings::default();

    assert!(settings.toggle(EditorMode::Lock, OverlayKind::Direction).unwrap());
    assert!(settings.is_shown(EditorMode::Lock, OverlayKind::Direction));

    assert!(!settings.toggle(EditorMode::Lock, OverlayKind::Direction).unwrap());
    assert!(!settings.is_shown(EditorMode::Lock, OverlayKind::Direction));
}

#[test]
fn test_popup_slot_allows_one_popup() {
    let mut slot = OverlayPopupSlot::new();
    let mut settings = OverlaySettings::default();

    {
        let popup = slot.launch().expect("first launch succeeds");
        popup
            .toggle(&mut settings, EditorMode::Edit, OverlayKind::Border)
            .unwrap();
    }
    assert!(slot.is_open());
    assert!(slot.launch().is_none());

    slot.close();
    assert!(!slot.is_open());
    assert!(slot.launch().is_some());

    assert!(settings.is_shown(EditorMode::Edit, OverlayKind::Border));
}

#[test]
fn test_overlay_settings_survive_config_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yml");
    let path = path.to_str().unwrap();

    let mut config = Config::default();
    config.overlays.set(EditorMode::Edit, OverlayKind::Origin, true).unwrap();
    config.overlays.set(EditorMode::Alt, OverlayKind::Direction, true).unwrap();
    config.save(Some(path)).unwrap();

    let loaded = Config::load(Some(path)).unwrap();
    assert_eq!(loaded.overlays, config.overlays);
    assert_eq!(loaded.exporter.toolchain, "hvcc");
    assert_eq!(loaded.exporter.poll_interval_ms, 100);
}

#[test]
fn test_config_created_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("fresh.yml");
    let path = path.to_str().unwrap();

    let config = Config::load(Some(path)).unwrap();
    assert_eq!(config.overlays, OverlaySettings::default());
    assert!(temp_dir.path().join("fresh.yml").exists());
}

#[test]
fn test_message_display_waits_for_hover_delay() {
    let t0 = Instant::now();
    let mut display = MessageDisplay::new();

    display.set_connection(t0, Some(7));
    assert!(!display.is_visible());

    display.tick(t0 + Duration::from_millis(400));
    assert!(!display.is_visible());

    display.tick(t0 + Duration::from_millis(500));
    assert!(display.is_visible());
    assert_eq!(display.hovered(), Some(7));
}

#[test]
fn test_message_display_shows_instantly_after_recent_hide() {
    let t0 = Instant::now();
    let mut display = MessageDisplay::new();

    display.set_connection(t0, Some(1));
    display.tick(t0 + Duration::from_millis(500));
    assert!(display.is_visible());

    display.set_connection(t0 + Duration::from_millis(600), None);
    assert!(!display.is_visible());

    // Within the reuse window the next hover skips the delay
    display.set_connection(t0 + Duration::from_millis(800), Some(2));
    assert!(display.is_visible());
    assert_eq!(display.hovered(), Some(2));
}

#[test]
fn test_message_display_reuse_window_expires() {
    let t0 = Instant::now();
    let mut display = MessageDisplay::new();

    display.set_connection(t0, None);

    let later = t0 + Duration::from_millis(700);
    display.tick(later);
    display.set_connection(later, Some(3));
    assert!(!display.is_visible());

    display.tick(later + Duration::from_millis(500));
    assert!(display.is_visible());
}

#[test]
fn test_message_display_text_fallback_and_width() {
    let t0 = Instant::now();
    let mut display = MessageDisplay::new();

    display.set_connection(t0, Some(4));
    display.set_message("", 50.0);
    assert_eq!(display.text(), "no message yet");
    assert_eq!(display.width(), 50.0);

    // While the hover lasts the width only grows
    display.set_message("3.14", 40.0);
    assert_eq!(display.width(), 50.0);
    display.set_message("3.14159 2.71828", 80.0);
    assert_eq!(display.width(), 80.0);

    // A fresh hover may shrink it again
    display.set_connection(t0 + Duration::from_millis(100), None);
    display.set_connection(t0 + Duration::from_millis(200), Some(5));
    display.set_message("bang", 30.0);
    assert_eq!(display.width(), 30.0);
    assert_eq!(display.text(), "bang");
}

#[test]
fn test_message_display_ignores_messages_without_hover() {
    let t0 = Instant::now();
    let mut display = MessageDisplay::new();

    display.set_message("stray", 99.0);
    assert_eq!(display.text(), "no message yet");
    assert_eq!(display.width(), 0.0);

    // A pending hover that ends before the delay never shows
    display.set_connection(t0, Some(6));
    display.set_connection(t0 + Duration::from_millis(100), None);
    display.tick(t0 + Duration::from_millis(600));
    assert!(!display.is_visible());
}
