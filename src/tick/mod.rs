//! Background tick source
//!
//! The tick source runs on its own thread for the whole process lifetime so
//! ticks keep arriving while the main loop is busy rendering or reading
//! input. It is driven by `TickCommand` messages and emits `TickEvent::Tick`
//! into the consumer's event channel once per interval.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use focuschain_protocol::{TickCommand, TickEvent};
use tracing::{debug, trace, warn};

/// Default tick interval
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Something that delivers ticks to the controller
pub trait TickSource: Send {
    /// Begin emitting ticks. Restarts the interval if already active.
    fn start(&mut self);

    /// Stop emitting ticks. Safe to call when already stopped.
    fn stop(&mut self);

    fn is_active(&self) -> bool;
}

/// Tick source backed by a dedicated thread
#[derive(Debug)]
pub struct ThreadTickSource {
    commands: Option<Sender<TickCommand>>,
    handle: Option<JoinHandle<()>>,
    active: bool,
    interval: Duration,
}

impl ThreadTickSource {
    /// Spawn the tick thread. Ticks are converted into the consumer's event
    /// type and sent on `sink`.
    pub fn spawn<E>(interval: Duration, sink: Sender<E>) -> io::Result<Self>
    where
        E: From<TickEvent> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("focuschain-tick".to_string())
            .spawn(move || tick_loop(interval, rx, sink))?;
        debug!(interval_ms = interval.as_millis() as u64, "tick thread spawned");
        Ok(Self {
            commands: Some(tx),
            handle: Some(handle),
            active: false,
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn send(&mut self, command: TickCommand) {
        let delivered = self
            .commands
            .as_ref()
            .map(|tx| tx.send(command).is_ok())
            .unwrap_or(false);
        if !delivered {
            warn!(?command, "tick thread is gone; command dropped");
        }
    }
}

impl TickSource for ThreadTickSource {
    fn start(&mut self) {
        self.send(TickCommand::Start);
        self.active = true;
    }

    fn stop(&mut self) {
        if self.active {
            self.send(TickCommand::Stop);
        }
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for ThreadTickSource {
    fn drop(&mut self) {
        // Disconnecting the command channel ends the loop.
        self.commands.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("tick thread panicked");
            }
        }
    }
}

fn tick_loop<E>(interval: Duration, commands: Receiver<TickCommand>, sink: Sender<E>)
where
    E: From<TickEvent>,
{
    let mut deadline: Option<Instant> = None;
    loop {
        let received = match deadline {
            None => commands.recv().map_err(|_| RecvTimeoutError::Disconnected),
            Some(at) => commands.recv_timeout(at.saturating_duration_since(Instant::now())),
        };
        match received {
            Ok(TickCommand::Start) => {
                deadline = Some(Instant::now() + interval);
            }
            Ok(TickCommand::Stop) => {
                deadline = None;
            }
            Err(RecvTimeoutError::Timeout) => {
                trace!("tick");
                if sink.send(E::from(TickEvent::Tick)).is_err() {
                    debug!("tick consumer hung up");
                    return;
                }
                deadline = deadline.map(|at| (at + interval).max(Instant::now()));
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}
