use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Products shipped with the seed fixture, as `(id, name, active)`.
const SEED_PRODUCTS: &[(&str, &str, bool)] = &[
    ("prod-cnc-machining", "CNC Machining", true),
    ("prod-swiss-turning", "Swiss Turning", true),
    ("prod-sheet-metal", "Sheet Metal Fabrication", true),
    ("prod-injection-molding", "Injection Molding", true),
    ("prod-mechanical-assembly", "Mechanical Assembly", true),
    ("prod-wire-harness", "Wire Harness Assembly", true),
    ("prod-legacy-casting", "Sand Casting", false),
];

/// Starter product catalog for local and demo databases.
///
/// Loading is idempotent: rows are upserted by id.
pub struct ProductCatalogSeed;

impl ProductCatalogSeed {
    pub const SQL: &str = include_str!("../../../config/fixtures/product_catalog.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            products_seeded: SEED_PRODUCTS.len(),
            active_products: SEED_PRODUCTS.iter().filter(|(_, _, active)| *active).count(),
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for (id, name, active) in SEED_PRODUCTS {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM product WHERE id = ?1 AND name = ?2 AND active = ?3)",
            )
            .bind(*id)
            .bind(*name)
            .bind(*active)
            .fetch_one(pool)
            .await?;
            checks.push((*id, present == 1));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;
        for (id, _, _) in SEED_PRODUCTS {
            sqlx::query("DELETE FROM product WHERE id = ?").bind(*id).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub fn product_ids() -> impl Iterator<Item = &'static str> {
        SEED_PRODUCTS.iter().map(|(id, _, _)| *id)
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub products_seeded: usize,
    pub active_products: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn seed_loads_and_verifies() {
        let pool = setup().await;

        let result = ProductCatalogSeed::load(&pool).await.expect("load");
        assert_eq!(result.products_seeded, 7);
        assert_eq!(result.active_products, 6);

        let verification = ProductCatalogSeed::verify(&pool).await.expect("verify");
        assert!(verification.all_present, "checks: {:?}", verification.checks);
    }

    #[tokio::test]
    async fn seed_is_idempotent() {
        let pool = setup().await;
        ProductCatalogSeed::load(&pool).await.expect("first load");
        ProductCatalogSeed::load(&pool).await.expect("second load");

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM product").fetch_one(&pool).await.expect("count");
        assert_eq!(count, 7);
    }

    #[tokio::test]
    async fn clean_removes_seeded_rows() {
        let pool = setup().await;
        ProductCatalogSeed::load(&pool).await.expect("load");
        ProductCatalogSeed::clean(&pool).await.expect("clean");

        let verification = ProductCatalogSeed::verify(&pool).await.expect("verify");
        assert!(!verification.all_present);
        assert!(verification.checks.iter().all(|(_, present)| !present));
    }
}
