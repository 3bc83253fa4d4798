//! Migration service - discovers and applies pending migration files
//!
//! Each candidate is checked against the ledger, executed through the
//! configured client command, and recorded only after the command succeeded.
//! Files are handled strictly one at a time, in lexicographic path order;
//! the first error ends the run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::adapters::ProcessRunner;
use crate::config::Config;
use crate::domain::result::{Error, Result};
use crate::domain::{MigrationFile, MigrationId, Outcome, SkipReason};
use crate::ports::CommandRunner;
use crate::services::Ledger;

/// Result of running migrations
#[derive(Debug, Default, Serialize)]
pub struct MigrationResult {
    /// Newly applied migrations, in the order they ran
    pub applied: Vec<MigrationId>,
    /// Candidates that were not executed
    pub skipped: Vec<SkippedMigration>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedMigration {
    pub id: MigrationId,
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// List migration candidates under `source`
///
/// A file yields itself. A directory yields all of its entries, including
/// subdirectories, sorted by path. Ordering is lexicographic only, so
/// numbered migrations need zero padding (`01.sql`, not `1.sql`).
pub fn list_candidates(source: &Path) -> Result<Vec<MigrationFile>> {
    let discovery_err = |source_err| Error::Discovery {
        path: source.to_path_buf(),
        source: source_err,
    };

    let metadata = fs::metadata(source).map_err(discovery_err)?;
    if !metadata.is_dir() {
        return Ok(vec![MigrationFile::new(source)]);
    }

    let mut paths = fs::read_dir(source)
        .map_err(discovery_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<PathBuf>>>()
        .map_err(discovery_err)?;
    paths.sort();

    Ok(paths.into_iter().map(MigrationFile::new).collect())
}

/// Decide whether a candidate should be executed
///
/// Returns the skip reason, or `None` if the file is pending. Checks run in
/// a fixed order: directory, already applied, extension.
pub fn classify(
    file: &MigrationFile,
    is_applied: impl Fn(&MigrationId) -> bool,
    extension: &str,
) -> Result<Option<SkipReason>> {
    let metadata = fs::metadata(&file.path).map_err(|source| Error::Discovery {
        path: file.path.clone(),
        source,
    })?;

    if metadata.is_dir() {
        return Ok(Some(SkipReason::Directory));
    }
    if is_applied(&file.id) {
        return Ok(Some(SkipReason::AlreadyApplied));
    }
    if !file.matches_extension(extension) {
        return Ok(Some(SkipReason::ExtensionMismatch));
    }
    Ok(None)
}

/// Service for applying migrations through an external command
pub struct MigrationService<R = ProcessRunner> {
    config: Config,
    ledger: Ledger,
    runner: R,
}

impl MigrationService<ProcessRunner> {
    /// Create a service that runs the configured command as a child process
    pub fn new(config: Config) -> Result<Self> {
        Self::with_runner(config, ProcessRunner::new())
    }
}

impl<R: CommandRunner> MigrationService<R> {
    /// Validate `config` and open (and lock) its ledger
    ///
    /// Nothing under the source location is touched if this fails.
    pub fn with_runner(config: Config, runner: R) -> Result<Self> {
        config.validate()?;
        let ledger = Ledger::open(&config.ledger)?;

        Ok(Self {
            config,
            ledger,
            runner,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Candidates under the configured source, in application order
    pub fn candidates(&self) -> Result<Vec<MigrationFile>> {
        list_candidates(&self.config.source)
    }

    /// Apply a single candidate if it is pending
    ///
    /// The ledger is appended only after the command exited successfully.
    /// A failed append is reported as `Error::LedgerWrite`: the migration
    /// ran but will look pending to the next run.
    pub fn apply(&mut self, file: &MigrationFile) -> Result<Outcome> {
        let ledger = &self.ledger;
        if let Some(reason) = classify(file, |id| ledger.contains(id), &self.config.extension)? {
            debug!(migration = %file.id, %reason, "skipping migration");
            return Ok(Outcome::Skipped(reason));
        }

        let invocation = self.config.command.render(&file.path)?;

        self.runner
            .run(&invocation)
            .map_err(|failure| Error::Execution {
                path: file.path.clone(),
                cause: failure.cause,
                stderr: failure.stderr,
            })?;

        if let Err(source) = self.ledger.record(&file.id) {
            warn!(
                migration = %file.id,
                ledger = %self.ledger.path().display(),
                "migration executed but not recorded"
            );
            return Err(Error::LedgerWrite {
                path: file.path.clone(),
                id: file.id.clone(),
                source,
            });
        }

        info!(migration = %file.id, command = %invocation, "applied migration");
        Ok(Outcome::Applied)
    }

    /// Run all pending migrations
    pub fn run_pending(&mut self) -> Result<MigrationResult> {
        self.run_pending_with(|_, _| {})
    }

    /// Run all pending migrations, reporting each candidate's outcome
    ///
    /// Stops at the first error; later candidates are not looked at.
    pub fn run_pending_with<F>(&mut self, mut on_file: F) -> Result<MigrationResult>
    where
        F: FnMut(&MigrationFile, &Outcome),
    {
        let mut result = MigrationResult::default();

        for file in self.candidates()? {
            let outcome = self.apply(&file)?;
            on_file(&file, &outcome);

            match outcome {
                Outcome::Applied => result.applied.push(file.id),
                Outcome::Skipped(reason) => result.skipped.push(SkippedMigration {
                    id: file.id,
                    path: file.path,
                    reason,
                }),
            }
        }

        info!(applied = result.applied.len(), "database is up-to-date");
        Ok(result)
    }

    /// Release the ledger. Safe to call more than once.
    pub fn close(&mut self) -> std::io::Result<()> {
        self.ledger.close()
    }
}
