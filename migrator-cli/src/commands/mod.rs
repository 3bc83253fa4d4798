//! CLI command implementations

pub mod status;
pub mod up;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use migrator_core::{CommandTemplate, Config, ConfigOverrides};

/// Where migrations come from and how they are applied
///
/// Flags override environment variables, which override the settings file.
#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// JSON settings file providing defaults for the options below
    #[arg(long, env = "MIGRATOR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Directory to search for migration files, or a single migration file
    /// [default: project/db/migrate]
    #[arg(long, env = "MIGRATOR_DIR", global = true)]
    pub dir: Option<PathBuf>,

    /// Command that applies one migration; %s is replaced by the file path.
    /// Arguments are split on whitespace, shell quoting is not supported
    #[arg(long, env = "MIGRATOR_EXEC", global = true)]
    pub exec: Option<String>,

    /// File listing already applied migrations (use one per project)
    /// [default: /tmp/migrations.lock]
    #[arg(long, env = "MIGRATOR_LOCK", global = true)]
    pub lock: Option<PathBuf>,

    /// Extension of migration files [default: .sql]
    #[arg(long, env = "MIGRATOR_EXT", global = true)]
    pub ext: Option<String>,
}

impl SettingsArgs {
    /// Build the configuration from defaults, settings file and flags
    pub fn resolve(&self) -> Result<Config> {
        let config = Config::load(self.config.as_deref()).context("Failed to load settings")?;

        Ok(config.with_overrides(ConfigOverrides {
            source: self.dir.clone(),
            command: self.exec.clone().map(CommandTemplate::Literal),
            ledger: self.lock.clone(),
            extension: self.ext.clone(),
        }))
    }
}
