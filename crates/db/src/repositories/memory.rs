use std::collections::HashMap;

use tokio::sync::RwLock;

use rfq_core::catalog::{CatalogError, ProductCatalog};
use rfq_core::domain::contact::{ContactMessage, ContactMessageId, SubmittedContactMessage};
use rfq_core::domain::product::{CatalogEntry, Product, ProductId};
use rfq_core::domain::quote_request::{QuoteDraft, QuoteRequestId, SubmittedQuoteRequest};
use rfq_core::submission::{
    ContactMessageSink, QuoteSubmissionSink, SubmissionError, SubmissionReceipt,
};

use super::{
    ContactMessageRepository, ProductRepository, QuoteRequestRepository, RepositoryError,
};

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<String, Product>>,
}

impl InMemoryProductRepository {
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: RwLock::new(
                products.into_iter().map(|product| (product.id.0.clone(), product)).collect(),
            ),
        }
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        let mut active: Vec<Product> =
            products.values().filter(|product| product.active).cloned().collect();
        active.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.0.cmp(&b.id.0)));
        Ok(active)
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), product);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProductCatalog for InMemoryProductRepository {
    async fn list(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let products =
            self.list_active().await.map_err(|error| CatalogError::Unavailable(error.to_string()))?;
        Ok(products.iter().map(Product::catalog_entry).collect())
    }
}

#[derive(Default)]
pub struct InMemoryQuoteRequestRepository {
    requests: RwLock<HashMap<String, SubmittedQuoteRequest>>,
}

impl InMemoryQuoteRequestRepository {
    pub async fn len(&self) -> usize {
        self.requests.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.requests.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl QuoteRequestRepository for InMemoryQuoteRequestRepository {
    async fn find_by_id(
        &self,
        id: &QuoteRequestId,
    ) -> Result<Option<SubmittedQuoteRequest>, RepositoryError> {
        let requests = self.requests.read().await;
        Ok(requests.get(&id.0).cloned())
    }

    async fn insert(&self, request: &SubmittedQuoteRequest) -> Result<(), RepositoryError> {
        let mut requests = self.requests.write().await;
        requests.insert(request.id.0.clone(), request.clone());
        Ok(())
    }
}

#[async_trait::async_trait]
impl QuoteSubmissionSink for InMemoryQuoteRequestRepository {
    async fn create(&self, draft: &QuoteDraft) -> Result<SubmissionReceipt, SubmissionError> {
        let request = SubmittedQuoteRequest::pending(draft.clone());
        self.insert(&request)
            .await
            .map_err(|error| SubmissionError::Unavailable(error.to_string()))?;
        Ok(SubmissionReceipt { id: request.id.0, submitted_at: request.submitted_at })
    }
}

#[derive(Default)]
pub struct InMemoryContactMessageRepository {
    messages: RwLock<HashMap<String, SubmittedContactMessage>>,
}

impl InMemoryContactMessageRepository {
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl ContactMessageRepository for InMemoryContactMessageRepository {
    async fn find_by_id(
        &self,
        id: &ContactMessageId,
    ) -> Result<Option<SubmittedContactMessage>, RepositoryError> {
        let messages = self.messages.read().await;
        Ok(messages.get(&id.0).cloned())
    }

    async fn insert(&self, message: &SubmittedContactMessage) -> Result<(), RepositoryError> {
        let mut messages = self.messages.write().await;
        messages.insert(message.id.0.clone(), message.clone());
        Ok(())
    }
}

#[async_trait::async_trait]
impl ContactMessageSink for InMemoryContactMessageRepository {
    async fn create(&self, message: &ContactMessage) -> Result<SubmissionReceipt, SubmissionError> {
        let submitted = SubmittedContactMessage::new(message.clone());
        self.insert(&submitted)
            .await
            .map_err(|error| SubmissionError::Unavailable(error.to_string()))?;
        Ok(SubmissionReceipt { id: submitted.id.0, submitted_at: submitted.submitted_at })
    }
}

/// Sink that refuses every submission. Used to exercise failure paths.
#[derive(Clone, Debug)]
pub struct FailingSubmissionSink {
    reason: String,
}

impl FailingSubmissionSink {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait::async_trait]
impl QuoteSubmissionSink for FailingSubmissionSink {
    async fn create(&self, _draft: &QuoteDraft) -> Result<SubmissionReceipt, SubmissionError> {
        Err(SubmissionError::Unavailable(self.reason.clone()))
    }
}

#[async_trait::async_trait]
impl ContactMessageSink for FailingSubmissionSink {
    async fn create(&self, _message: &ContactMessage) -> Result<SubmissionReceipt, SubmissionError> {
        Err(SubmissionError::Unavailable(self.reason.clone()))
    }
}

/// Catalog whose listing always fails.
#[derive(Clone, Debug)]
pub struct UnavailableCatalog {
    reason: String,
}

impl UnavailableCatalog {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait::async_trait]
impl ProductCatalog for UnavailableCatalog {
    async fn list(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        Err(CatalogError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use rfq_core::catalog::ProductCatalog;
    use rfq_core::domain::product::{Product, ProductId};
    use rfq_core::domain::quote_request::{QuoteDraft, QuoteRequestId};
    use rfq_core::submission::{QuoteSubmissionSink, SubmissionError};

    use crate::repositories::{
        FailingSubmissionSink, InMemoryProductRepository, InMemoryQuoteRequestRepository,
        ProductRepository, QuoteRequestRepository, UnavailableCatalog,
    };

    #[tokio::test]
    async fn in_memory_catalog_is_sorted_and_filtered() {
        let repo = InMemoryProductRepository::with_products(vec![
            Product {
                id: ProductId("b".to_string()),
                name: "Sheet Metal Fabrication".to_string(),
                category: "components".to_string(),
                active: true,
            },
            Product {
                id: ProductId("a".to_string()),
                name: "CNC Machining".to_string(),
                category: "precision-parts".to_string(),
                active: true,
            },
            Product {
                id: ProductId("c".to_string()),
                name: "Die Casting".to_string(),
                category: "custom".to_string(),
                active: false,
            },
        ]);

        let ids: Vec<String> =
            repo.list().await.expect("list").into_iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
        assert!(repo.find_by_id(&ProductId("c".to_string())).await.expect("find").is_some());
    }

    #[tokio::test]
    async fn in_memory_sink_stores_pending_request() {
        let repo = InMemoryQuoteRequestRepository::default();
        let receipt = repo.create(&QuoteDraft::default()).await.expect("create");

        let stored = repo
            .find_by_id(&QuoteRequestId(receipt.id))
            .await
            .expect("find")
            .expect("stored");
        assert_eq!(stored.draft, QuoteDraft::default());
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn failure_doubles_always_fail() {
        let sink = FailingSubmissionSink::new("maintenance window");
        let error = QuoteSubmissionSink::create(&sink, &QuoteDraft::default())
            .await
            .expect_err("always fails");
        assert_eq!(error, SubmissionError::Unavailable("maintenance window".to_string()));

        assert!(UnavailableCatalog::new("timeout").list().await.is_err());
    }
}
