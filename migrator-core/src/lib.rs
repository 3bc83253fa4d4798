//! Migrator Core - ledger-tracked execution of migration files
//!
//! Applies pending migration files in lexicographic order by handing each
//! one to an external database client, and appends its name to a ledger
//! file once the client succeeds. Re-running is a no-op for everything the
//! ledger already lists.
//!
//! The crate follows a hexagonal layout:
//!
//! - **domain**: Migration identifiers, files, outcomes, command templates, errors
//! - **ports**: Trait definitions for external dependencies (CommandRunner)
//! - **services**: Ledger, migration runner and status orchestration
//! - **adapters**: Concrete implementations (child processes)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export commonly used types at crate root
pub use config::{Config, ConfigOverrides};
pub use domain::result::{Error, Result};
pub use domain::{CommandTemplate, Invocation, MigrationFile, MigrationId, Outcome, SkipReason};
pub use services::{
    Ledger, MigrationResult, MigrationService, MigrationState, StatusService, StatusSummary,
};
