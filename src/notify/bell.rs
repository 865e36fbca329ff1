//! Terminal bell cue
//!
//! A terminal cannot synthesize tones, so each tone of a cue becomes one BEL
//! character written at the tone's offset.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use tracing::debug;

use super::{Cue, SoundPlayer};

const BEL: &[u8] = b"\x07";

/// Rings the terminal bell on stderr
#[derive(Debug, Default)]
pub struct TerminalBell;

impl TerminalBell {
    pub fn new() -> Self {
        Self
    }
}

impl SoundPlayer for TerminalBell {
    fn play(&mut self, cue: &Cue) {
        let mut offsets: Vec<u64> = cue.tones.iter().map(|t| t.offset_ms).collect();
        offsets.sort_unstable();

        // Runs off the event loop so the cue never delays a tick.
        let spawned = thread::Builder::new()
            .name("focuschain-bell".to_string())
            .spawn(move || {
                let mut elapsed = 0;
                for offset in offsets {
                    thread::sleep(Duration::from_millis(offset.saturating_sub(elapsed)));
                    elapsed = offset;
                    let mut stderr = io::stderr();
                    let _ = stderr.write_all(BEL);
                    let _ = stderr.flush();
                }
            });
        if let Err(e) = spawned {
            debug!(error = %e, "could not start bell thread");
        }
    }
}
