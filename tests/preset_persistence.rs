//! Preset persistence tests
//!
//! Presets and the notification answer written through a `FileStore`
//! must survive a fresh controller on the same directory.

use focuschain::mock::{ManualTickSource, RecordingNotifier, RecordingPlayer};
use focuschain::notify::load_permission;
use focuschain::{
    Capabilities, FileStore, FocusController, KernelState, Permission, PresetStore,
    SequenceBuilder, TimerMode,
};
use std::path::Path;
use tempfile::TempDir;

fn controller_at(dir: &Path, view: TimerMode) -> FocusController {
    FocusController::new(
        SequenceBuilder::default(),
        view,
        Capabilities {
            ticks: Box::new(ManualTickSource::new()),
            notifier: Box::new(RecordingNotifier::default()),
            sound: Box::new(RecordingPlayer::default()),
            store: Box::new(FileStore::new(dir)),
        },
    )
}

#[test]
fn test_saved_preset_survives_restart() {
    let dir = TempDir::new().unwrap();

    let saved = {
        let mut controller = controller_at(dir.path(), TimerMode::Chain);
        let id = controller.add_step();
        controller.set_step_label(&id, "Deep Work");
        controller.set_step_duration(&id, 50);
        controller.save_preset("  Morning  ").unwrap()
    };
    assert_eq!(saved.name, "Morning");
    assert_eq!(saved.steps.len(), 3);

    let mut controller = controller_at(dir.path(), TimerMode::Single);
    assert_eq!(controller.presets().len(), 1);
    let loaded = controller.load_preset("Morning").unwrap();
    assert_eq!(loaded, saved);
    assert_eq!(controller.view_mode(), TimerMode::Chain);
    assert_eq!(controller.builder().chain().steps(), saved.steps.steps());
    assert_eq!(controller.snapshot().display_seconds, 25 * 60);
}

#[test]
fn test_rename_and_delete_persist() {
    let dir = TempDir::new().unwrap();
    let id = {
        let mut controller = controller_at(dir.path(), TimerMode::Chain);
        let first = controller.save_preset("First").unwrap();
        controller.save_preset("Second").unwrap();
        assert!(controller.rename_preset(&first.id, "Renamed").unwrap());
        first.id
    };

    let mut presets = PresetStore::load(Box::new(FileStore::new(dir.path())));
    let names: Vec<&str> = presets.list().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Renamed", "Second"]);

    assert!(presets.delete(&id).unwrap());
    assert!(!presets.delete(&id).unwrap());

    let reopened = PresetStore::load(Box::new(FileStore::new(dir.path())));
    assert_eq!(reopened.list().len(), 1);
    assert_eq!(reopened.list()[0].name, "Second");
}

#[test]
fn test_corrupt_presets_file_reads_as_empty() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("focus_presets.json"), "{ not json").unwrap();

    let mut controller = controller_at(dir.path(), TimerMode::Chain);
    assert!(controller.presets().is_empty());

    // Saving replaces the corrupt value
    controller.save_preset("Fresh").unwrap();
    let reopened = PresetStore::load(Box::new(FileStore::new(dir.path())));
    assert_eq!(reopened.list().len(), 1);
}

#[test]
fn test_loading_preset_resets_chain_run_only() {
    let dir = TempDir::new().unwrap();
    let mut controller = controller_at(dir.path(), TimerMode::Chain);
    controller.save_preset("Default chain").unwrap();

    controller.toggle();
    controller.tick();
    controller.load_preset("Default chain").unwrap();
    assert_eq!(controller.kernel().state(), KernelState::Idle);

    controller.set_view_mode(TimerMode::Single);
    controller.toggle();
    controller.tick();
    controller.load_preset("Default chain").unwrap();
    assert_eq!(controller.kernel().state(), KernelState::Running);
    assert_eq!(controller.kernel().active_mode(), Some(TimerMode::Single));
    assert_eq!(controller.kernel().remaining_seconds(), 25 * 60 - 1);
}

#[test]
fn test_permission_answer_persists() {
    let dir = TempDir::new().unwrap();
    assert_eq!(load_permission(&FileStore::new(dir.path())), Permission::Default);

    let mut controller = controller_at(dir.path(), TimerMode::Single);
    controller.set_permission(Permission::Granted).unwrap();

    assert_eq!(load_permission(&FileStore::new(dir.path())), Permission::Granted);
}

#[test]
fn test_preset_with_repeated_step_ids_stays_editable() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("focus_presets.json"),
        r#"[{"id":"p1","name":"Hand edited","steps":[
            {"id":"1","label":"Focus","duration":25},
            {"id":"1","label":"Break","duration":5}
        ]}]"#,
    )
    .unwrap();

    let mut controller = controller_at(dir.path(), TimerMode::Chain);
    controller.load_preset("Hand edited").unwrap();
    assert!(controller.remove_step("1"));
    assert_eq!(controller.builder().chain().len(), 1);
    assert!(!controller.remove_step("1"));

    controller.toggle();
    assert_eq!(controller.kernel().state(), KernelState::Running);
    assert_eq!(controller.kernel().remaining_seconds(), 5 * 60);
}
