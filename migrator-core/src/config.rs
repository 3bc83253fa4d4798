//! Configuration management
//!
//! A `Config` is built once per process and handed to the services. Values
//! are layered: built-in defaults, then an optional JSON settings file, then
//! explicit overrides (environment variables and flags, resolved by the CLI).
//!
//! ```json
//! {
//!   "source": "project/db/migrate",
//!   "command": { "program": "psql", "args": ["-v", "ON_ERROR_STOP=1", "-f", "%s"] },
//!   "ledger": "/var/lib/app/migrations.lock",
//!   "extension": ".sql"
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::CommandTemplate;

pub const DEFAULT_SOURCE: &str = "project/db/migrate";
pub const DEFAULT_LEDGER: &str = "/tmp/migrations.lock";
pub const DEFAULT_EXTENSION: &str = ".sql";

/// Raw settings file structure; every key is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    #[serde(default)]
    source: Option<PathBuf>,
    #[serde(default)]
    command: Option<CommandTemplate>,
    #[serde(default)]
    ledger: Option<PathBuf>,
    #[serde(default)]
    extension: Option<String>,
}

/// Values that take precedence over the settings file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source: Option<PathBuf>,
    pub command: Option<CommandTemplate>,
    pub ledger: Option<PathBuf>,
    pub extension: Option<String>,
}

/// Migrator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Directory of migration files, or a single migration file
    pub source: PathBuf,
    /// Client invocation, with `%s` standing for the migration path
    pub command: CommandTemplate,
    /// Ledger file recording applied migrations
    pub ledger: PathBuf,
    /// Only files with this extension are applied
    pub extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_SOURCE),
            command: CommandTemplate::default(),
            ledger: PathBuf::from(DEFAULT_LEDGER),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl Config {
    pub fn new(
        source: impl Into<PathBuf>,
        command: CommandTemplate,
        ledger: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            command,
            ledger: ledger.into(),
            extension: extension.into(),
        }
    }

    /// Load defaults, overlaid with `settings_path` when given
    ///
    /// An explicitly named settings file must exist.
    pub fn load(settings_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = settings_path {
            let content = std::fs::read_to_string(path).map_err(|e| Error::Settings {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            let raw: SettingsFile = serde_json::from_str(&content).map_err(|e| Error::Settings {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

            config = config.with_overrides(ConfigOverrides {
                source: raw.source,
                command: raw.command,
                ledger: raw.ledger,
                extension: raw.extension,
            });
        }

        Ok(config)
    }

    /// Replace every field for which an override is present
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(source) = overrides.source {
            self.source = source;
        }
        if let Some(command) = overrides.command {
            self.command = command;
        }
        if let Some(ledger) = overrides.ledger {
            self.ledger = ledger;
        }
        if let Some(extension) = overrides.extension {
            self.extension = extension;
        }
        self
    }

    /// All four values must be non-empty and the command must have exactly
    /// one path placeholder
    pub fn validate(&self) -> Result<()> {
        self.check_non_empty(true)?;
        self.command.validate()
    }

    /// Source, ledger and extension must be non-empty; the command is not
    /// looked at. Enough for read-only inspection.
    pub fn validate_locations(&self) -> Result<()> {
        self.check_non_empty(false)
    }

    fn check_non_empty(&self, with_command: bool) -> Result<()> {
        if self.source.as_os_str().is_empty() {
            return Err(Error::config("empty dir"));
        }
        if with_command && self.command.is_empty() {
            return Err(Error::config("empty exec"));
        }
        if self.ledger.as_os_str().is_empty() {
            return Err(Error::config("empty lock"));
        }
        if self.extension.trim().is_empty() {
            return Err(Error::config("empty ext"));
        }
        Ok(())
    }
}
