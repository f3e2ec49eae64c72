//! Migrate command - Schema management for the marketplace tables.

use sea_orm::DbErr;

use crate::cli::args::{MigrateAction, MigrateArgs};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;

/// Execute the migrate command
pub async fn execute(args: MigrateArgs, config: Config) -> AppResult<()> {
    // `connect` would apply pending migrations before `down` or `status` ran
    let db = Database::connect_without_migrations(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;

    match args.action {
        MigrateAction::Up => {
            db.run_migrations().await.map_err(migration_failed)?;
            tracing::info!("Schema is up to date");
        }
        MigrateAction::Down => {
            db.rollback_migration().await.map_err(migration_failed)?;
            tracing::info!("Rolled back the latest migration");
        }
        MigrateAction::Status => {
            let applied = db.migration_status().await.map_err(migration_failed)?;
            for line in status_report(&applied) {
                println!("{}", line);
            }
        }
        MigrateAction::Fresh => {
            tracing::warn!("Dropping every marketplace table, orders and reviews included");
            db.fresh_migrations().await.map_err(migration_failed)?;
            tracing::info!("Schema rebuilt from scratch");
        }
    }

    Ok(())
}

/// One line per migration plus a pending-count summary.
fn status_report(migrations: &[(String, bool)]) -> Vec<String> {
    let pending = migrations.iter().filter(|(_, applied)| !applied).count();
    migrations
        .iter()
        .map(|(name, applied)| {
            format!("{:<48} {}", name, if *applied { "applied" } else { "pending" })
        })
        .chain(std::iter::once(format!(
            "{} of {} migrations pending",
            pending,
            migrations.len()
        )))
        .collect()
}

fn migration_failed(e: DbErr) -> AppError {
    AppError::internal(format!("Migration failed: {}", e))
}
