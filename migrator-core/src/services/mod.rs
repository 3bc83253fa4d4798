//! Service layer - migration orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case.

mod ledger;
pub mod migration;
mod status;

pub use ledger::Ledger;
pub use migration::{list_candidates, MigrationResult, MigrationService, SkippedMigration};
pub use status::{MigrationState, MigrationStatus, StatusService, StatusSummary};
