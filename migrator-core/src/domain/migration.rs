//! Migration file domain model

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Ledger key of a migration: the base name of its file (e.g. `03.sql`)
///
/// Two files with the same base name in different directories share an
/// identifier, so only one of them will ever be applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MigrationId(String);

impl MigrationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier for a path: its final component, or the whole path when
    /// there is none (e.g. `..`)
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A candidate unit of work discovered on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub path: PathBuf,
    pub id: MigrationId,
    /// Text after the last dot of the base name, if it has a dot.
    /// A dotfile such as `.sql` has extension `sql`.
    pub extension: Option<String>,
}

impl MigrationFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = MigrationId::from_path(&path);
        let extension = id
            .as_str()
            .rfind('.')
            .map(|dot| id.as_str()[dot + 1..].to_string());
        Self {
            path,
            id,
            extension,
        }
    }

    /// Whether this file's extension equals `filter`.
    ///
    /// The filter may be written with or without its leading dot. The
    /// extension is taken from the last dot of the base name, so `.sql`
    /// and `01.sql.bak` have extensions `sql` and `bak`.
    pub fn matches_extension(&self, filter: &str) -> bool {
        let wanted = filter.strip_prefix('.').unwrap_or(filter);
        self.extension.as_deref() == Some(wanted)
    }
}

/// Why a candidate was not executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Directory,
    AlreadyApplied,
    ExtensionMismatch,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Directory => "directory",
            SkipReason::AlreadyApplied => "already applied",
            SkipReason::ExtensionMismatch => "extension mismatch",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one candidate within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum Outcome {
    Applied,
    Skipped(SkipReason),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}
