//! What the front end shows
//!
//! The big clock reflects the *viewed* mode: the live countdown when that
//! mode owns the run in progress, otherwise the mode's configured first
//! duration.

use focuschain_protocol::APP_NAME;

use crate::kernel::KernelSnapshot;
use crate::sequence::SequenceBuilder;
use crate::state::KernelState;
use crate::TimerMode;

/// Label shown while a single-mode run is viewed
pub const SINGLE_ACTIVE_LABEL: &str = "Focusing";

/// Task name used in the window title for single-mode runs
pub const SINGLE_TITLE_TASK: &str = "Focus";

/// Label shown when the viewed mode has no run
pub const READY_LABEL: &str = "Ready";

/// `M:SS`, minutes unbounded
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn is_viewing_active(view_mode: TimerMode, kernel: &KernelSnapshot) -> bool {
    kernel.active_mode == Some(view_mode)
}

/// Seconds shown on the clock for `view_mode`
pub fn display_seconds(
    view_mode: TimerMode,
    kernel: &KernelSnapshot,
    builder: &SequenceBuilder,
) -> u32 {
    if is_viewing_active(view_mode, kernel) {
        kernel.remaining_seconds
    } else {
        builder.first_duration(view_mode).saturating_mul(60)
    }
}

/// Progress through the active step, 0-100. Zero unless the viewed mode is
/// running.
pub fn progress_percent(view_mode: TimerMode, kernel: &KernelSnapshot) -> f64 {
    if !is_viewing_active(view_mode, kernel) || kernel.state != KernelState::Running {
        return 0.0;
    }
    match kernel.step_seconds {
        Some(total) if total > 0 => {
            let elapsed = total.saturating_sub(kernel.remaining_seconds);
            f64::from(elapsed) / f64::from(total) * 100.0
        }
        _ => 0.0,
    }
}

/// Status label above the clock
pub fn status_label(view_mode: TimerMode, kernel: &KernelSnapshot) -> String {
    if !is_viewing_active(view_mode, kernel) {
        return READY_LABEL.to_string();
    }
    match kernel.active_mode {
        Some(TimerMode::Single) => SINGLE_ACTIVE_LABEL.to_string(),
        _ => kernel.active_label.clone().unwrap_or_default(),
    }
}

/// Notice shown when another mode's run is in progress
pub fn background_notice(view_mode: TimerMode, kernel: &KernelSnapshot) -> Option<String> {
    match kernel.active_mode {
        Some(mode) if mode != view_mode => Some(format!("Timer running in {} mode", mode)),
        _ => None,
    }
}

/// Skip is offered only while viewing a chain run with steps left
pub fn can_skip(view_mode: TimerMode, kernel: &KernelSnapshot) -> bool {
    is_viewing_active(view_mode, kernel)
        && kernel.active_mode == Some(TimerMode::Chain)
        && kernel.can_skip
}

/// Window/terminal title: live countdown while running, app name otherwise
pub fn window_title(kernel: &KernelSnapshot) -> String {
    if kernel.state != KernelState::Running {
        return APP_NAME.to_string();
    }
    let task = match kernel.active_mode {
        Some(TimerMode::Single) => SINGLE_TITLE_TASK.to_string(),
        _ => kernel.active_label.clone().unwrap_or_default(),
    };
    format!("{} {}", format_clock(kernel.remaining_seconds), task)
}
