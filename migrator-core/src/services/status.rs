//! Status service - read-only view of applied and pending migrations

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::Config;
use crate::domain::result::Result;
use crate::domain::{MigrationId, SkipReason};
use crate::services::migration::{classify, list_candidates};
use crate::services::Ledger;

/// Status service for inspecting a migration source against its ledger
///
/// Unlike `MigrationService` this neither creates nor locks the ledger, so
/// it can run alongside a migration in progress.
pub struct StatusService {
    config: Config,
}

impl StatusService {
    /// Only the locations are validated; no command is ever run
    pub fn new(config: Config) -> Result<Self> {
        config.validate_locations()?;
        Ok(Self { config })
    }

    /// Get overall status summary
    pub fn get_status(&self) -> Result<StatusSummary> {
        let recorded = Ledger::read(&self.config.ledger)?;
        let applied_set: HashSet<&str> = recorded.iter().map(String::as_str).collect();

        let mut migrations = Vec::new();
        for file in list_candidates(&self.config.source)? {
            let state = match classify(
                &file,
                |id| applied_set.contains(id.as_str()),
                &self.config.extension,
            )? {
                None => MigrationState::Pending,
                Some(SkipReason::AlreadyApplied) => MigrationState::Applied,
                Some(reason) => MigrationState::Ignored { reason },
            };
            migrations.push(MigrationStatus {
                id: file.id,
                path: file.path,
                state,
            });
        }

        let pending = migrations
            .iter()
            .filter(|m| m.state == MigrationState::Pending)
            .count();

        Ok(StatusSummary {
            source: self.config.source.clone(),
            ledger: self.config.ledger.clone(),
            recorded,
            pending,
            migrations,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub source: PathBuf,
    pub ledger: PathBuf,
    /// Ledger entries in file order
    pub recorded: Vec<String>,
    pub pending: usize,
    /// Every candidate under the source, in application order
    pub migrations: Vec<MigrationStatus>,
}

#[derive(Debug, Serialize)]
pub struct MigrationStatus {
    pub id: MigrationId,
    pub path: PathBuf,
    #[serde(flatten)]
    pub state: MigrationState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum MigrationState {
    Applied,
    Pending,
    Ignored { reason: SkipReason },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    use crate::domain::CommandTemplate;

    #[test]
    fn test_status_classifies_candidates() {
        let dir = tempdir().unwrap();
        let migrate = dir.path().join("migrate");
        fs::create_dir(&migrate).unwrap();
        for name in ["01.sql", "02.sql", "03.sql", "notes.md"] {
            fs::write(migrate.join(name), "").unwrap();
        }
        let ledger = dir.path().join("migrations.lock");
        fs::write(&ledger, "02.sql\n01.sql\n").unwrap();

        let config = Config::new(
            &migrate,
            CommandTemplate::Literal("psql -f %s".into()),
            &ledger,
            ".sql",
        );
        let status = StatusService::new(config).unwrap().get_status().unwrap();

        assert_eq!(status.recorded, vec!["02.sql", "01.sql"]);
        assert_eq!(status.pending, 1);
        let states: Vec<(String, MigrationState)> = status
            .migrations
            .iter()
            .map(|m| (m.id.to_string(), m.state))
            .collect();
        assert_eq!(
            states,
            vec![
                ("01.sql".to_string(), MigrationState::Applied),
                ("02.sql".to_string(), MigrationState::Applied),
                ("03.sql".to_string(), MigrationState::Pending),
                (
                    "notes.md".to_string(),
                    MigrationState::Ignored {
                        reason: SkipReason::ExtensionMismatch
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_status_without_command() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("01.sql"), "").unwrap();
        fs::write(dir.path().join("02.txt"), "").unwrap();
        let config = Config::new(
            dir.path(),
            CommandTemplate::default(),
            dir.path().join("migrations.lock"),
            ".sql",
        );

        let status = StatusService::new(config).unwrap().get_status().unwrap();
        let json = serde_json::to_value(&status.migrations).unwrap();

        assert_eq!(json[0]["id"], "01.sql");
        assert_eq!(json[0]["state"], "pending");
        assert_eq!(json[1]["state"], "ignored");
        assert_eq!(json[1]["reason"], "extension_mismatch");
    }

    #[test]
    fn test_status_does_not_create_ledger() {
        let dir = tempdir().unwrap();
        let ledger = dir.path().join("migrations.lock");
        let config = Config::new(
            dir.path(),
            CommandTemplate::Literal("psql -f %s".into()),
            &ledger,
            ".sql",
        );

        let status = StatusService::new(config).unwrap().get_status().unwrap();

        assert!(status.recorded.is_empty());
        assert!(!ledger.exists());
    }
}
