//! Core domain entities
//!
//! Pure data structures with validation logic - no I/O beyond path
//! inspection.

pub mod command;
mod migration;
pub mod result;

pub use command::{CommandTemplate, Invocation, PATH_PLACEHOLDER};
pub use migration::{MigrationFile, MigrationId, Outcome, SkipReason};
