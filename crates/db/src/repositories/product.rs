use chrono::Utc;
use sqlx::Row;

use rfq_core::catalog::{CatalogError, ProductCatalog};
use rfq_core::domain::product::{CatalogEntry, Product, ProductId};

use super::{decode_err, ProductRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let name: String = row.try_get("name").map_err(decode_err)?;
    let category: String = row.try_get("category").map_err(decode_err)?;
    let active: bool = row.try_get("active").map_err(decode_err)?;

    Ok(Product { id: ProductId(id), name, category, active })
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, category, active FROM product WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_product(r)?)),
            None => Ok(None),
        }
    }

    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, category, active FROM product WHERE active = 1 ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO product (id, name, category, active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 category = excluded.category,
                 active = excluded.active,
                 updated_at = excluded.updated_at",
        )
        .bind(&product.id.0)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.active)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ProductCatalog for SqlProductRepository {
    async fn list(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let products =
            self.list_active().await.map_err(|error| CatalogError::Unavailable(error.to_string()))?;
        Ok(products.iter().map(Product::catalog_entry).collect())
    }
}

#[cfg(test)]
mod tests {
    use rfq_core::catalog::ProductCatalog;
    use rfq_core::domain::product::{Product, ProductId};

    use super::SqlProductRepository;
    use crate::repositories::ProductRepository;
    use crate::{connect_with_settings, migrations};

    fn product(id: &str, name: &str, active: bool) -> Product {
        Product {
            id: ProductId(id.to_string()),
            name: name.to_string(),
            category: "precision-parts".to_string(),
            active,
        }
    }

    #[tokio::test]
    async fn catalog_lists_active_products_by_name() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let repo = SqlProductRepository::new(pool);

        repo.save(product("prod-wire", "Wire Harness Assembly", true)).await.expect("save");
        repo.save(product("prod-cnc", "CNC Machining", true)).await.expect("save");
        repo.save(product("prod-cast", "Anodized Castings", false)).await.expect("save");

        let entries = repo.list().await.expect("catalog list");
        let names: Vec<&str> = entries.iter().map(|entry| entry.display_name.as_str()).collect();
        assert_eq!(names, vec!["CNC Machining", "Wire Harness Assembly"]);
    }

    #[tokio::test]
    async fn save_upserts_existing_product() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let repo = SqlProductRepository::new(pool);

        repo.save(product("prod-cnc", "CNC Machining", true)).await.expect("save");
        repo.save(product("prod-cnc", "5-Axis CNC Machining", false)).await.expect("upsert");

        let found = repo
            .find_by_id(&ProductId("prod-cnc".to_string()))
            .await
            .expect("find")
            .expect("present");
        assert_eq!(found.name, "5-Axis CNC Machining");
        assert!(!found.active);
        assert!(repo.list_active().await.expect("list").is_empty());
    }
}
