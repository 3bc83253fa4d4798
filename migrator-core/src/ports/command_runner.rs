//! Command runner port - external database client abstraction
//!
//! Defines how a rendered migration command is executed. The migration
//! service only sees success or a failure description; it never talks to
//! the database itself.

use crate::domain::Invocation;

/// Why an invocation did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    /// Spawn error or exit status
    pub cause: String,
    /// Everything the child wrote to stderr
    pub stderr: String,
}

/// Executes one migration command to completion
///
/// Implementations must block until the command has finished: the next
/// migration is only considered once this one has succeeded and been
/// recorded.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), CommandFailure>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<(), CommandFailure> {
        (**self).run(invocation)
    }
}
