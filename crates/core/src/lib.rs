pub mod audit;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod submission;
pub mod validation;

pub use catalog::{CatalogError, ProductCatalog};
pub use domain::contact::{ContactMessage, ContactMessageId, SubmittedContactMessage};
pub use domain::product::{CatalogEntry, Product, ProductId, ProductOption};
pub use domain::quote_request::{
    BudgetRange, Certification, DraftField, LineItem, LineItemField, QuoteDraft, QuoteRequestId,
    QuoteRequestStatus, SubmittedQuoteRequest, Timeline,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{QuoteWizard, WizardError, WizardStep, WizardView};
pub use submission::{ContactMessageSink, QuoteSubmissionSink, SubmissionError, SubmissionReceipt};
pub use validation::ValidationErrors;
