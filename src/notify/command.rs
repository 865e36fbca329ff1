//! Notifications through an external command
//!
//! With a configured program (for example `notify-send`), the title and
//! body are appended as the last two arguments. Without one, the
//! notification is written to stderr.

use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;

use tracing::debug;

use super::{Notifier, NotifyError, Permission};

/// Notifier that runs a command per notification
#[derive(Debug, Default)]
pub struct CommandNotifier {
    program: Option<Vec<String>>,
    permission: Permission,
}

impl CommandNotifier {
    pub fn new(program: Option<Vec<String>>, permission: Permission) -> Self {
        Self { program, permission }
    }
}

impl Notifier for CommandNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn set_permission(&mut self, permission: Permission) {
        self.permission = permission;
    }

    fn notify(&mut self, title: &str, body: &str) -> Result<(), NotifyError> {
        let Some(argv) = self.program.as_ref() else {
            let mut stderr = io::stderr();
            writeln!(stderr, "\n[{}] {}", title, body)?;
            return Ok(());
        };
        let (program, args) = argv.split_first().ok_or(NotifyError::EmptyCommand)?;

        let mut child = Command::new(program)
            .args(args)
            .arg(title)
            .arg(body)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        debug!(program = %program, "notification command spawned");

        // Reap the child without holding up the timer.
        thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}
