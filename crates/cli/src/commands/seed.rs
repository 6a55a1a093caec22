use techshop_core::config::LoadOptions;
use techshop_db::{DemoCatalog, SeedResult};

use crate::commands::{load_config, migrated_pool, runtime, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("seed", LoadOptions::default()) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = migrated_pool(&config).await?;

        let seeded = DemoCatalog::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let verification = DemoCatalog::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;
        pool.close().await;

        if verification.all_present {
            Ok(seeded)
        } else {
            Err(("seed_verification", failed_checks_message(&verification.checks), 6u8))
        }
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", summary(&seeded)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn summary(seeded: &SeedResult) -> String {
    format!(
        "demo catalog loaded: {} categories, {} brands, {} products, {} variants, {} promotions",
        seeded.categories, seeded.brands, seeded.products, seeded.variants, seeded.promotions
    )
}

fn failed_checks_message(checks: &[(&'static str, bool)]) -> String {
    let failed = checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect::<Vec<_>>();
    if failed.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use techshop_db::SeedResult;

    use super::{failed_checks_message, summary};

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let checks = [("categories", true), ("variants", false), ("terabyte-storage-normalized", false)];

        assert_eq!(
            failed_checks_message(&checks),
            "Seed verification failed for checks: variants, terabyte-storage-normalized"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        assert_eq!(
            failed_checks_message(&[("categories", true), ("brands", true)]),
            "Some seed data failed to load"
        );
    }

    #[test]
    fn summary_lists_row_counts() {
        let seeded =
            SeedResult { categories: 5, brands: 5, products: 10, variants: 14, promotions: 4 };
        assert_eq!(
            summary(&seeded),
            "demo catalog loaded: 5 categories, 5 brands, 10 products, 14 variants, 4 promotions"
        );
    }
}
