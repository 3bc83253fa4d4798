//! Result and error types for the core library

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::MigrationId;

/// Core library error type
///
/// `Execution` and `LedgerWrite` are kept apart on purpose: the first means
/// the database was not touched, the second means it was changed but the
/// ledger does not know about it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error in {}: {message}", .path.display())]
    Settings { path: PathBuf, message: String },

    #[error("Cannot read migration source {}", .path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot open ledger {}", .path.display())]
    LedgerOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Ledger {} is locked by another migrator process", .path.display())]
    LedgerLocked { path: PathBuf },

    #[error("Cannot execute migration file {}: {cause}, {stderr}", .path.display())]
    Execution {
        path: PathBuf,
        cause: String,
        stderr: String,
    },

    #[error(
        "Migration file {} was executed but could not be recorded as {id} in the ledger",
        .path.display()
    )]
    LedgerWrite {
        path: PathBuf,
        id: MigrationId,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True when a migration ran but its ledger entry is missing.
    ///
    /// The next run would execute it again unless the identifier is
    /// appended to the ledger by hand.
    pub fn requires_manual_intervention(&self) -> bool {
        matches!(self, Self::LedgerWrite { .. })
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
