//! Up command - apply all pending migrations

use anyhow::{Context, Result};
use migrator_core::{MigrationService, Outcome};

use super::SettingsArgs;
use crate::output;

pub fn run(settings: &SettingsArgs, json: bool) -> Result<()> {
    let config = settings.resolve()?;
    let mut service = MigrationService::new(config).context("Failed to initialize migrator")?;

    let result = service.run_pending_with(|file, outcome| {
        if json {
            return;
        }
        match outcome {
            Outcome::Applied => output::success(&format!("migrate {}", file.id)),
            Outcome::Skipped(_) => output::info(&format!("ignore {}", file.id)),
        }
    });
    let closed = service.close();

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            if e.requires_manual_intervention() {
                output::warning(&format!(
                    "The migration was applied to the database. Append its name to {} \
                     before running again, or it will be applied twice.",
                    service.ledger().path().display()
                ));
            }
            return Err(e.into());
        }
    };

    closed.context("Failed to close ledger")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    output::success("database is up-to-date");
    Ok(())
}
