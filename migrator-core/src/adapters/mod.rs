//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Child processes for the CommandRunner port

pub mod process;

pub use process::ProcessRunner;
