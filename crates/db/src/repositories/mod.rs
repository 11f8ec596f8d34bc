use async_trait::async_trait;
use thiserror::Error;

use rfq_core::domain::contact::{ContactMessageId, SubmittedContactMessage};
use rfq_core::domain::product::{Product, ProductId};
use rfq_core::domain::quote_request::{QuoteRequestId, SubmittedQuoteRequest};

pub mod contact;
pub mod memory;
pub mod product;
pub mod quote_request;

pub use contact::SqlContactMessageRepository;
pub use memory::{
    FailingSubmissionSink, InMemoryContactMessageRepository, InMemoryProductRepository,
    InMemoryQuoteRequestRepository, UnavailableCatalog,
};
pub use product::SqlProductRepository;
pub use quote_request::SqlQuoteRequestRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
    /// Active products ordered by name.
    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn save(&self, product: Product) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait QuoteRequestRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: &QuoteRequestId,
    ) -> Result<Option<SubmittedQuoteRequest>, RepositoryError>;
    async fn insert(&self, request: &SubmittedQuoteRequest) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ContactMessageRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: &ContactMessageId,
    ) -> Result<Option<SubmittedContactMessage>, RepositoryError>;
    async fn insert(&self, message: &SubmittedContactMessage) -> Result<(), RepositoryError>;
}

pub(crate) fn decode_err(error: impl ToString) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}
