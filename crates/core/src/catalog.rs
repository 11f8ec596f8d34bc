use async_trait::async_trait;
use thiserror::Error;

use crate::domain::product::CatalogEntry;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("product catalog unavailable: {0}")]
    Unavailable(String),
}

/// Read-only source of sellable products for the line-item selector.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn list(&self) -> Result<Vec<CatalogEntry>, CatalogError>;
}
