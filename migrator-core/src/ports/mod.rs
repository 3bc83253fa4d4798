//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod command_runner;

pub use command_runner::{CommandFailure, CommandRunner};
