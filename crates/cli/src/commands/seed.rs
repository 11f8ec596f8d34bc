use rfq_db::{DbPool, ProductCatalogSeed, SeedResult};

use crate::commands::{with_migrated_pool, CommandResult, StepFailure};

pub fn run() -> CommandResult {
    match with_migrated_pool("seed", load_and_verify) {
        Ok(seeded) => CommandResult::success(
            "seed",
            format!(
                "product catalog seeded: {} product(s), {} active\n{}",
                seeded.products_seeded,
                seeded.active_products,
                ProductCatalogSeed::product_ids()
                    .map(|id| format!("  - {id}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        ),
        Err(failure) => failure,
    }
}

async fn load_and_verify(pool: DbPool) -> Result<SeedResult, StepFailure> {
    let seeded = ProductCatalogSeed::load(&pool)
        .await
        .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

    let verification = ProductCatalogSeed::verify(&pool)
        .await
        .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

    if !verification.all_present {
        let failed = failed_checks(&verification.checks);
        return Err(("seed_verification", verification_message(&failed), 6u8));
    }

    Ok(seeded)
}

fn failed_checks<'a>(checks: &[(&'a str, bool)]) -> Vec<&'a str> {
    checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect()
}

fn verification_message(failed: &[&str]) -> String {
    if failed.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for products: {}", failed.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::{failed_checks, verification_message};

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let checks = [
            ("prod-cnc-machining", true),
            ("prod-sheet-metal", false),
            ("prod-wire-harness", false),
        ];

        assert_eq!(
            verification_message(&failed_checks(&checks)),
            "Seed verification failed for products: prod-sheet-metal, prod-wire-harness"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        let checks = [("prod-cnc-machining", true), ("prod-swiss-turning", true)];

        assert_eq!(verification_message(&failed_checks(&checks)), "Some seed data failed to load");
    }
}
