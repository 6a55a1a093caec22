use techshop_core::config::LoadOptions;
use techshop_db::migrations;

use crate::commands::{load_config, migrated_pool, runtime, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("migrate", LoadOptions::default()) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("migrate") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = migrated_pool(&config).await?;
        let versions = migrations::applied_versions(&pool)
            .await
            .map_err(|error| ("migration_status", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<Vec<i64>, (&'static str, String, u8)>(versions)
    });

    match result {
        Ok(versions) => {
            let listed = versions.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");
            CommandResult::success(
                "migrate",
                format!("schema up to date; applied migrations: [{listed}]"),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}
