//! Focus controller
//!
//! Owns the timer kernel, the sequence builder, the preset store and the
//! injected capabilities. Every user command and every tick goes through
//! here; kernel effects are applied in order to the tick source and the
//! completion alert.
//!
//! The controller tracks the *viewed* mode separately from the mode of the
//! run in progress, so one mode can be edited while the other keeps
//! ticking in the background.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use focuschain_protocol::{ControlCommand, PresetReport, SetupReport, StatusReport, StepReport};

use crate::display;
use crate::kernel::{Effect, KernelSnapshot, TimerKernel};
use crate::notify::{save_permission, CompletionAlert, Notifier, Permission, SoundPlayer};
use crate::preset::{Preset, PresetError, PresetStore};
use crate::sequence::{SequenceBuilder, SequenceError};
use crate::state::Completion;
use crate::store::{KeyValueStore, StoreError};
use crate::tick::TickSource;
use crate::TimerMode;

/// Controller errors
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("preset error: {0}")]
    Preset(#[from] PresetError),

    #[error("sequence error: {0}")]
    Sequence(#[from] SequenceError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("no chain step '{0}'")]
    StepNotFound(String),
}

/// Whether the caller should keep processing events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Injected capabilities
pub struct Capabilities {
    pub ticks: Box<dyn TickSource>,
    pub notifier: Box<dyn Notifier>,
    pub sound: Box<dyn SoundPlayer>,
    pub store: Box<dyn KeyValueStore>,
}

/// Read-only view for front ends
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub view_mode: TimerMode,
    pub kernel: KernelSnapshot,
    pub display_seconds: u32,
    pub clock: String,
    pub label: String,
    pub progress_percent: f64,
    pub can_skip: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_notice: Option<String>,
    pub title: String,
    pub permission: Permission,
}

impl Snapshot {
    /// Wire form for the control protocol
    pub fn to_report(&self) -> StatusReport {
        StatusReport {
            view_mode: self.view_mode,
            active_mode: self.kernel.active_mode,
            phase: self.kernel.state.into(),
            display_seconds: self.display_seconds,
            clock: self.clock.clone(),
            label: self.label.clone(),
            step_index: self.kernel.active_step_index,
            step_count: self.kernel.step_count,
            progress_percent: self.progress_percent,
            can_skip: self.can_skip,
            background_notice: self.background_notice.clone(),
            title: self.title.clone(),
        }
    }
}

/// The single owner of all timer state
pub struct FocusController {
    kernel: TimerKernel,
    builder: SequenceBuilder,
    presets: PresetStore,
    view_mode: TimerMode,
    ticks: Box<dyn TickSource>,
    alert: CompletionAlert,
}

impl FocusController {
    /// Build a controller. Presets are read from the store once, here.
    pub fn new(builder: SequenceBuilder, view_mode: TimerMode, caps: Capabilities) -> Self {
        let presets = PresetStore::load(caps.store);
        let kernel = TimerKernel::new(view_mode, &builder);
        Self {
            kernel,
            builder,
            presets,
            view_mode,
            ticks: caps.ticks,
            alert: CompletionAlert::new(caps.notifier, caps.sound),
        }
    }

    pub fn view_mode(&self) -> TimerMode {
        self.view_mode
    }

    pub fn kernel(&self) -> &TimerKernel {
        &self.kernel
    }

    pub fn builder(&self) -> &SequenceBuilder {
        &self.builder
    }

    pub fn presets(&self) -> &[Preset] {
        self.presets.list()
    }

    pub fn permission(&self) -> Permission {
        self.alert.permission()
    }

    // ---------------------------------------------------------------------
    // Timer commands
    // ---------------------------------------------------------------------

    /// Start/pause button for the viewed mode
    pub fn toggle(&mut self) -> Vec<Completion> {
        let effects = self.kernel.toggle(self.view_mode, &self.builder);
        self.apply(effects)
    }

    /// Start a fresh run of `mode`
    pub fn start(&mut self, mode: TimerMode) -> Vec<Completion> {
        let effects = self.kernel.start(mode, &self.builder);
        self.apply(effects)
    }

    pub fn pause(&mut self) -> Vec<Completion> {
        let effects = self.kernel.pause();
        self.apply(effects)
    }

    pub fn resume(&mut self) -> Vec<Completion> {
        let effects = self.kernel.resume();
        self.apply(effects)
    }

    pub fn reset(&mut self) -> Vec<Completion> {
        let effects = self.kernel.reset(self.view_mode, &self.builder);
        self.apply(effects)
    }

    /// Returns whether the run advanced
    pub fn skip(&mut self) -> bool {
        self.kernel.skip()
    }

    /// One tick from the tick source
    pub fn tick(&mut self) -> Vec<Completion> {
        let effects = self.kernel.tick(self.view_mode, &self.builder);
        self.apply(effects)
    }

    pub fn set_view_mode(&mut self, mode: TimerMode) {
        if self.view_mode != mode {
            debug!(from = %self.view_mode, to = %mode, "view mode changed");
        }
        self.view_mode = mode;
        self.kernel.sync_idle(self.view_mode, &self.builder);
    }

    // ---------------------------------------------------------------------
    // Builder edits
    // ---------------------------------------------------------------------

    pub fn set_single_duration(&mut self, minutes: u32) {
        self.builder.set_single_duration(minutes);
        self.kernel.sync_idle(self.view_mode, &self.builder);
    }

    pub fn add_step(&mut self) -> String {
        let id = self.builder.add_step();
        self.kernel.sync_idle(self.view_mode, &self.builder);
        id
    }

    pub fn remove_step(&mut self, id: &str) -> bool {
        let removed = self.builder.remove_step(id);
        self.kernel.sync_idle(self.view_mode, &self.builder);
        removed
    }

    pub fn set_step_label(&mut self, id: &str, label: &str) -> bool {
        self.builder.set_step_label(id, label)
    }

    pub fn set_step_duration(&mut self, id: &str, minutes: u32) -> bool {
        let changed = self.builder.set_step_duration(id, minutes);
        self.kernel.sync_idle(self.view_mode, &self.builder);
        changed
    }

    // ---------------------------------------------------------------------
    // Presets
    // ---------------------------------------------------------------------

    /// Save the current chain steps under `name`
    pub fn save_preset(&mut self, name: &str) -> Result<Preset, ControllerError> {
        let chain = self.builder.chain().clone();
        Ok(self.presets.save(name, &chain)?)
    }

    pub fn rename_preset(&mut self, id: &str, name: &str) -> Result<bool, ControllerError> {
        Ok(self.presets.rename(id, name)?)
    }

    pub fn delete_preset(&mut self, id: &str) -> Result<bool, ControllerError> {
        Ok(self.presets.delete(id)?)
    }

    /// Load a preset (by id or name) into the chain builder and switch the
    /// view to chain mode. A chain run in progress is reset; a single run
    /// keeps going. Never starts a run.
    pub fn load_preset(&mut self, id_or_name: &str) -> Result<Preset, ControllerError> {
        let preset = self
            .presets
            .find(id_or_name)
            .cloned()
            .ok_or_else(|| PresetError::NotFound(id_or_name.to_string()))?;
        self.builder.replace_chain(preset.steps.steps().to_vec())?;
        self.view_mode = TimerMode::Chain;

        if self.kernel.active_mode() == Some(TimerMode::Chain) {
            let effects = self.kernel.reset(self.view_mode, &self.builder);
            self.apply(effects);
        } else {
            self.kernel.sync_idle(self.view_mode, &self.builder);
        }
        info!(id = %preset.id, name = %preset.name, "preset loaded");
        Ok(preset)
    }

    // ---------------------------------------------------------------------
    // Notifications
    // ---------------------------------------------------------------------

    /// Record the user's answer to the permission prompt
    pub fn set_permission(&mut self, permission: Permission) -> Result<(), ControllerError> {
        self.alert.set_permission(permission);
        save_permission(self.presets.store_mut(), permission)?;
        info!(%permission, "notification permission updated");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Protocol entry point
    // ---------------------------------------------------------------------

    /// Apply a control command. Completions never result from commands, so
    /// only the flow is returned. A rejected command leaves every state
    /// untouched.
    pub fn handle(&mut self, command: ControlCommand) -> Result<Flow, ControllerError> {
        match command {
            ControlCommand::Toggle => {
                self.toggle();
            }
            ControlCommand::Start { mode } => {
                let mode = mode.unwrap_or(self.view_mode);
                self.view_mode = mode;
                self.start(mode);
            }
            ControlCommand::Pause => {
                self.pause();
            }
            ControlCommand::Resume => {
                self.resume();
            }
            ControlCommand::Reset => {
                self.reset();
            }
            ControlCommand::Skip => {
                if !self.skip() {
                    debug!("skip ignored");
                }
            }
            ControlCommand::SetMode { mode } => self.set_view_mode(mode),
            ControlCommand::SetSingleDuration { minutes } => self.set_single_duration(minutes),
            ControlCommand::AddStep => {
                self.add_step();
            }
            ControlCommand::RemoveStep { id } => {
                let id = self.resolve_step(&id)?;
                if !self.remove_step(&id) {
                    debug!(%id, "last chain step kept");
                }
            }
            ControlCommand::SetStepLabel { id, label } => {
                let id = self.resolve_step(&id)?;
                self.set_step_label(&id, &label);
            }
            ControlCommand::SetStepDuration { id, minutes } => {
                let id = self.resolve_step(&id)?;
                self.set_step_duration(&id, minutes);
            }
            ControlCommand::SavePreset { name } => {
                self.save_preset(&name)?;
            }
            ControlCommand::RenamePreset { id, name } => {
                let id = self.resolve_preset(&id)?;
                self.rename_preset(&id, &name)?;
            }
            ControlCommand::DeletePreset { id } => {
                let id = self.resolve_preset(&id)?;
                self.delete_preset(&id)?;
            }
            ControlCommand::LoadPreset { id } => {
                self.load_preset(&id)?;
            }
            ControlCommand::List => {}
            ControlCommand::AllowNotifications => self.set_permission(Permission::Granted)?,
            ControlCommand::DenyNotifications => self.set_permission(Permission::Denied)?,
            ControlCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Editable setup for front ends: both modes and the saved presets
    pub fn setup_report(&self) -> SetupReport {
        SetupReport {
            single_duration_minutes: self.builder.single_duration(),
            chain: self
                .builder
                .chain()
                .steps()
                .iter()
                .map(|s| StepReport {
                    id: s.id.clone(),
                    label: s.label.clone(),
                    duration: s.duration,
                })
                .collect(),
            presets: self
                .presets
                .list()
                .iter()
                .map(|p| PresetReport {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    step_count: p.steps.len(),
                    total_minutes: p.steps.total_minutes(),
                })
                .collect(),
        }
    }

    /// A step reference is an id, or failing that a 1-based position
    fn resolve_step(&self, reference: &str) -> Result<String, ControllerError> {
        let steps = self.builder.chain().steps();
        if let Some(step) = steps.iter().find(|s| s.id == reference) {
            return Ok(step.id.clone());
        }
        reference
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| steps.get(i))
            .map(|s| s.id.clone())
            .ok_or_else(|| ControllerError::StepNotFound(reference.to_string()))
    }

    fn resolve_preset(&self, reference: &str) -> Result<String, ControllerError> {
        self.presets
            .find(reference)
            .map(|p| p.id.clone())
            .ok_or_else(|| PresetError::NotFound(reference.to_string()).into())
    }

    pub fn snapshot(&self) -> Snapshot {
        let kernel = self.kernel.snapshot();
        let display_seconds = display::display_seconds(self.view_mode, &kernel, &self.builder);
        Snapshot {
            view_mode: self.view_mode,
            display_seconds,
            clock: display::format_clock(display_seconds),
            label: display::status_label(self.view_mode, &kernel),
            progress_percent: display::progress_percent(self.view_mode, &kernel),
            can_skip: display::can_skip(self.view_mode, &kernel),
            background_notice: display::background_notice(self.view_mode, &kernel),
            title: display::window_title(&kernel),
            permission: self.alert.permission(),
            kernel,
        }
    }

    /// Stop ticking; used on shutdown
    pub fn shutdown(&mut self) {
        self.ticks.stop();
    }

    fn apply(&mut self, effects: Vec<Effect>) -> Vec<Completion> {
        let mut completions = Vec::new();
        for effect in effects {
            match effect {
                Effect::StartTicking => self.ticks.start(),
                Effect::StopTicking => self.ticks.stop(),
                Effect::StepCompleted(completion) => {
                    self.alert.alert(&completion);
                    completions.push(completion);
                }
            }
        }
        completions
    }
}

impl std::fmt::Debug for FocusController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusController")
            .field("view_mode", &self.view_mode)
            .field("kernel", &self.kernel)
            .field("builder", &self.builder)
            .field("presets", &self.presets)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{ManualTickSource, MemoryStore, RecordingNotifier, RecordingPlayer};
    use crate::notify::load_permission;
    use crate::sequence::{Sequence, Step};
    use crate::state::KernelState;

    struct Harness {
        controller: FocusController,
        ticks: ManualTickSource,
        notifier: RecordingNotifier,
        player: RecordingPlayer,
        store: MemoryStore,
    }

    fn harness(builder: SequenceBuilder, view: TimerMode) -> Harness {
        let ticks = ManualTickSource::new();
        let notifier = RecordingNotifier::with_permission(Permission::Granted);
        let player = RecordingPlayer::default();
        let store = MemoryStore::new();
        let controller = FocusController::new(
            builder,
            view,
            Capabilities {
                ticks: Box::new(ticks.clone()),
                notifier: Box::new(notifier.clone()),
                sound: Box::new(player.clone()),
                store: Box::new(store.clone()),
            },
        );
        Harness {
            controller,
            ticks,
            notifier,
            player,
            store,
        }
    }

    fn chain(specs: &[(&str, u32)]) -> SequenceBuilder {
        let seq = Sequence::new(specs.iter().map(|(l, d)| Step::new(*l, *d)).collect()).unwrap();
        SequenceBuilder::new(1, seq)
    }

    #[test]
    fn test_effects_drive_tick_source() {
        let mut h = harness(SequenceBuilder::default(), TimerMode::Single);
        h.controller.toggle();
        assert!(h.ticks.active());
        h.controller.toggle();
        assert!(!h.ticks.active());
        h.controller.toggle();
        assert!(h.ticks.active());
        h.controller.reset();
        assert!(!h.ticks.active());
        assert_eq!(h.ticks.starts(), 2);
    }

    #[test]
    fn test_completion_alerts() {
        let mut h = harness(chain(&[("A", 1), ("B", 1)]), TimerMode::Chain);
        h.controller.start(TimerMode::Chain);
        let completed: Vec<_> = (0..120).flat_map(|_| h.controller.tick()).collect();

        assert_eq!(completed.len(), 2);
        assert_eq!(h.notifier.bodies(), vec!["A finished.", "B finished."]);
        assert_eq!(h.player.plays(), 2);
        assert!(!h.ticks.active());
        assert_eq!(h.controller.kernel().state(), KernelState::Idle);
    }

    #[test]
    fn test_skip_does_not_alert() {
        let mut h = harness(chain(&[("A", 1), ("B", 1)]), TimerMode::Chain);
        h.controller.start(TimerMode::Chain);
        assert!(h.controller.skip());
        assert!(h.notifier.sent().is_empty());
        assert_eq!(h.player.plays(), 0);
    }

    #[test]
    fn test_idle_edit_updates_display() {
        let mut h = harness(SequenceBuilder::default(), TimerMode::Single);
        h.controller.set_single_duration(40);
        assert_eq!(h.controller.kernel().remaining_seconds(), 2400);
        assert_eq!(h.controller.snapshot().clock, "40:00");
    }

    #[test]
    fn test_inactive_edit_leaves_run_alone() {
        let mut h = harness(SequenceBuilder::default(), TimerMode::Chain);
        h.controller.start(TimerMode::Chain);
        h.controller.tick();

        h.controller.set_view_mode(TimerMode::Single);
        h.controller.set_single_duration(10);
        assert_eq!(h.controller.kernel().remaining_seconds(), 1499);
        assert_eq!(h.controller.snapshot().display_seconds, 600);

        h.controller.set_view_mode(TimerMode::Chain);
        assert_eq!(h.controller.snapshot().display_seconds, 1499);
    }

    #[test]
    fn test_active_edit_while_running_waits_for_next_run() {
        let mut h = harness(SequenceBuilder::default(), TimerMode::Single);
        h.controller.start(TimerMode::Single);
        h.controller.set_single_duration(5);
        assert_eq!(h.controller.kernel().remaining_seconds(), 1500);
        h.controller.reset();
        assert_eq!(h.controller.kernel().remaining_seconds(), 300);
    }

    #[test]
    fn test_remove_last_step_keeps_chain() {
        let mut h = harness(chain(&[("Only", 3)]), TimerMode::Chain);
        let id = h.controller.builder().chain().first().id.clone();
        assert!(!h.controller.remove_step(&id));
        assert_eq!(h.controller.builder().chain().len(), 1);
    }

    #[test]
    fn test_load_preset_resets_chain_run() {
        let mut h = harness(chain(&[("A", 2), ("B", 2)]), TimerMode::Chain);
        let saved = h.controller.save_preset("Two").unwrap();
        h.controller.add_step();
        h.controller.start(TimerMode::Chain);
        h.controller.tick();

        h.controller.load_preset(&saved.id).unwrap();
        assert_eq!(h.controller.kernel().state(), KernelState::Idle);
        assert_eq!(h.controller.builder().chain(), &saved.steps);
        assert_eq!(h.controller.kernel().remaining_seconds(), 120);
        assert!(!h.ticks.active());
    }

    #[test]
    fn test_load_preset_keeps_single_run() {
        let mut h = harness(chain(&[("A", 2)]), TimerMode::Single);
        let saved = h.controller.save_preset("Solo").unwrap();
        h.controller.start(TimerMode::Single);
        h.controller.tick();

        h.controller.load_preset("Solo").unwrap();
        assert_eq!(h.controller.view_mode(), TimerMode::Chain);
        assert_eq!(h.controller.kernel().state(), KernelState::Running);
        assert_eq!(h.controller.kernel().active_mode(), Some(TimerMode::Single));
        assert_eq!(h.controller.snapshot().display_seconds, saved.steps.first().duration * 60);
        assert!(h.ticks.active());
    }

    #[test]
    fn test_load_unknown_preset() {
        let mut h = harness(SequenceBuilder::default(), TimerMode::Single);
        assert!(matches!(
            h.controller.load_preset("nope"),
            Err(ControllerError::Preset(PresetError::NotFound(_)))
        ));
    }

    #[test]
    fn test_permission_command_persists() {
        let mut h = harness(SequenceBuilder::default(), TimerMode::Single);
        assert_eq!(
            h.controller.handle(ControlCommand::DenyNotifications).unwrap(),
            Flow::Continue
        );
        assert_eq!(h.controller.permission(), Permission::Denied);
        assert_eq!(load_permission(&h.store), Permission::Denied);
    }

    #[test]
    fn test_start_command_switches_view() {
        let mut h = harness(SequenceBuilder::default(), TimerMode::Single);
        h.controller
            .handle(ControlCommand::Start {
                mode: Some(TimerMode::Chain),
            })
            .unwrap();
        assert_eq!(h.controller.view_mode(), TimerMode::Chain);
        assert_eq!(h.controller.kernel().active_mode(), Some(TimerMode::Chain));
        assert_eq!(h.controller.handle(ControlCommand::Quit).unwrap(), Flow::Quit);
    }

    #[test]
    fn test_snapshot_report() {
        let mut h = harness(SequenceBuilder::default(), TimerMode::Chain);
        h.controller.toggle();
        let report = h.controller.snapshot().to_report();
        assert_eq!(report.phase, focuschain_protocol::Phase::Running);
        assert_eq!(report.label, "Focus");
        assert_eq!(report.step_index, Some(0));
        assert_eq!(report.step_count, Some(2));
        assert!(report.can_skip);
    }

    #[test]
    fn test_editor_commands_by_position() {
        let mut h = harness(chain(&[("A", 5), ("B", 10)]), TimerMode::Chain);
        h.controller
            .handle(ControlCommand::SetStepLabel {
                id: "2".to_string(),
                label: "Stretch".to_string(),
            })
            .unwrap();
        h.controller
            .handle(ControlCommand::SetStepDuration {
                id: "1".to_string(),
                minutes: 3,
            })
            .unwrap();
        h.controller.handle(ControlCommand::AddStep).unwrap();

        let setup = h.controller.setup_report();
        let chain: Vec<(&str, u32)> = setup.chain.iter().map(|s| (s.label.as_str(), s.duration)).collect();
        assert_eq!(chain, [("A", 3), ("Stretch", 10), ("New Task", 25)]);
        assert_eq!(h.controller.snapshot().display_seconds, 180);

        h.controller
            .handle(ControlCommand::RemoveStep { id: "1".to_string() })
            .unwrap();
        assert_eq!(h.controller.setup_report().chain[0].label, "Stretch");
    }

    #[test]
    fn test_unknown_step_rejected() {
        let mut h = harness(chain(&[("A", 5)]), TimerMode::Chain);
        for reference in ["0", "2", "missing"] {
            assert!(matches!(
                h.controller.handle(ControlCommand::RemoveStep {
                    id: reference.to_string()
                }),
                Err(ControllerError::StepNotFound(_))
            ));
        }
        assert_eq!(h.controller.builder().chain().len(), 1);
    }

    #[test]
    fn test_preset_commands_accept_names() {
        let mut h = harness(SequenceBuilder::default(), TimerMode::Chain);
        h.controller
            .handle(ControlCommand::SavePreset { name: "Deep".to_string() })
            .unwrap();
        h.controller
            .handle(ControlCommand::RenamePreset {
                id: "Deep".to_string(),
                name: "Deeper".to_string(),
            })
            .unwrap();
        let setup = h.controller.setup_report();
        assert_eq!(setup.presets.len(), 1);
        assert_eq!(setup.presets[0].name, "Deeper");
        assert_eq!(setup.presets[0].total_minutes, 30);

        assert!(h
            .controller
            .handle(ControlCommand::LoadPreset { id: "Deep".to_string() })
            .is_err());
        h.controller
            .handle(ControlCommand::DeletePreset { id: "Deeper".to_string() })
            .unwrap();
        assert!(h.controller.presets().is_empty());
    }

    #[test]
    fn test_single_duration_command_leaves_chain_run() {
        let mut h = harness(chain(&[("A", 1), ("B", 1)]), TimerMode::Chain);
        h.controller.toggle();
        h.controller.tick();
        h.controller
            .handle(ControlCommand::SetMode { mode: TimerMode::Single })
            .unwrap();
        h.controller
            .handle(ControlCommand::SetSingleDuration { minutes: 40 })
            .unwrap();

        assert_eq!(h.controller.snapshot().display_seconds, 40 * 60);
        assert_eq!(h.controller.kernel().remaining_seconds(), 59);
        assert!(h.controller.kernel().is_running());
    }
}
