//! Status command - show applied, pending and ignored migrations

use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{Cell, Color};
use migrator_core::{MigrationState, StatusService};

use super::SettingsArgs;
use crate::output;

pub fn run(settings: &SettingsArgs, json: bool) -> Result<()> {
    let config = settings.resolve()?;
    let status = StatusService::new(config)
        .context("Failed to initialize migrator")?
        .get_status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Migration Status".bold());
    println!("Source: {}", status.source.display());
    println!("Ledger: {} ({} recorded)", status.ledger.display(), status.recorded.len());
    println!();

    if status.migrations.is_empty() {
        println!("No migration files found.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Migration", "State"]);
    for migration in &status.migrations {
        let state = match migration.state {
            MigrationState::Applied => Cell::new("applied").fg(Color::Green),
            MigrationState::Pending => Cell::new("pending").fg(Color::Yellow),
            MigrationState::Ignored { reason } => {
                Cell::new(format!("ignored ({})", reason)).fg(Color::DarkGrey)
            }
        };
        table.add_row(vec![Cell::new(migration.id.as_str()), state]);
    }
    println!("{}", table);
    println!();

    if status.pending == 0 {
        output::success("database is up-to-date");
    } else {
        output::warning(&format!("{} pending migration(s)", status.pending));
    }

    Ok(())
}
