//! Child process adapter for the CommandRunner port

use std::process::{Command, Stdio};

use tracing::debug;

use crate::domain::Invocation;
use crate::ports::{CommandFailure, CommandRunner};

/// Runs each invocation as a child process and waits for it
///
/// Stdin and stdout are connected to the null device; stderr is captured
/// and only surfaced when the command fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), CommandFailure> {
        debug!(command = %invocation, "spawning migration command");

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| CommandFailure {
                cause: e.to_string(),
                stderr: String::new(),
            })?;

        if output.status.success() {
            return Ok(());
        }

        Err(CommandFailure {
            cause: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
