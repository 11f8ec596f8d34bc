use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::catalog::ProductCatalog;
use crate::domain::product::{product_options, CatalogEntry, ProductOption};
use crate::domain::quote_request::{
    Certification, DraftField, LineItem, LineItemField, QuoteDraft, QuoteRequestId,
};
use crate::errors::DomainError;
use crate::flows::engine::{QuoteRequestFlow, WizardEngine, WizardTransitionError};
use crate::flows::review::ReviewSummary;
use crate::flows::states::{Notice, TransitionOutcome, WizardEvent, WizardStep};
use crate::submission::{QuoteSubmissionSink, SubmissionError, SubmissionReceipt};
use crate::validation::{ValidationErrors, PRODUCTS_FIELD};

pub const NEXT_BLOCKED_NOTICE: &str = "Please correct the errors before continuing";
pub const SUBMIT_BLOCKED_NOTICE: &str = "Please correct all errors before submitting";
pub const SUBMIT_SUCCESS_NOTICE: &str =
    "Quote request submitted successfully! We'll contact you within 24 hours.";
pub const SUBMIT_FAILURE_NOTICE: &str = "Failed to submit quote request. Please try again.";

#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Transition(#[from] WizardTransitionError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("a quote request submission is already in flight")]
    SubmissionInFlight,
    #[error("no quote request submission is in flight")]
    NoSubmissionInFlight,
    #[error("quote request submission failed: {0}")]
    Submission(#[source] SubmissionError),
}

/// One wizard session: the draft, the current step, and the errors and
/// notices raised by the last action.
pub struct QuoteWizard {
    engine: WizardEngine<QuoteRequestFlow>,
    step: WizardStep,
    draft: QuoteDraft,
    errors: ValidationErrors,
    notice: Option<Notice>,
    catalog: Vec<CatalogEntry>,
    submitting: bool,
    sink: Arc<dyn QuoteSubmissionSink>,
    audit: Option<(Arc<dyn AuditSink>, AuditContext)>,
}

impl QuoteWizard {
    pub fn new(catalog: Vec<CatalogEntry>, sink: Arc<dyn QuoteSubmissionSink>) -> Self {
        let engine = WizardEngine::default();
        Self {
            step: engine.initial_step(),
            engine,
            draft: QuoteDraft::default(),
            errors: ValidationErrors::new(),
            notice: None,
            catalog,
            submitting: false,
            sink,
            audit: None,
        }
    }

    /// Loads the catalog once. A failed load is logged and the selector falls
    /// back to the custom option only.
    pub async fn mount(catalog: &dyn ProductCatalog, sink: Arc<dyn QuoteSubmissionSink>) -> Self {
        let entries = match catalog.list().await {
            Ok(entries) => entries,
            Err(error) => {
                warn!(
                    event_name = "wizard.catalog.unavailable",
                    error = %error,
                    "product catalog failed to load; offering custom products only"
                );
                Vec::new()
            }
        };
        Self::new(entries, sink)
    }

    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>, context: AuditContext) -> Self {
        if self.catalog.is_empty() {
            sink.emit(AuditEvent::new(
                &context,
                "wizard.catalog_unavailable",
                AuditCategory::Catalog,
                AuditOutcome::Failed,
            ));
        }
        self.audit = Some((sink, context));
        self
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &QuoteDraft {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    pub fn product_options(&self) -> Vec<ProductOption> {
        product_options(&self.catalog)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn can_go_back(&self) -> bool {
        self.step.previous().is_some()
    }

    pub fn can_submit(&self) -> bool {
        self.step == WizardStep::Review && !self.submitting
    }

    pub fn sink(&self) -> Arc<dyn QuoteSubmissionSink> {
        Arc::clone(&self.sink)
    }

    pub fn review(&self) -> ReviewSummary {
        ReviewSummary::from_draft(&self.draft, &self.catalog)
    }

    pub fn set_field(&mut self, field: DraftField, value: &str) -> Result<(), WizardError> {
        self.ensure_idle()?;
        self.draft = self.draft.with_field(field, value)?;
        self.errors.clear_field(field.as_str());
        Ok(())
    }

    pub fn set_field_by_name(&mut self, field: &str, value: &str) -> Result<(), WizardError> {
        let field = field.parse::<DraftField>()?;
        self.set_field(field, value)
    }

    pub fn add_line_item(&mut self) -> Result<(), WizardError> {
        self.ensure_idle()?;
        self.draft = self.draft.with_line_item_added();
        Ok(())
    }

    /// Returns whether an item was removed; the last remaining item stays.
    pub fn remove_line_item(&mut self, index: usize) -> Result<bool, WizardError> {
        self.ensure_idle()?;
        let before = self.draft.line_items.len();
        self.draft = self.draft.with_line_item_removed(index);
        Ok(self.draft.line_items.len() < before)
    }

    pub fn update_line_item(
        &mut self,
        index: usize,
        field: LineItemField,
        value: &str,
    ) -> Result<(), WizardError> {
        self.ensure_idle()?;
        self.draft = self.draft.with_line_item_updated(index, field, value)?;
        self.errors.clear_field(PRODUCTS_FIELD);
        Ok(())
    }

    pub fn toggle_certification(&mut self, certification: Certification) -> Result<(), WizardError> {
        self.ensure_idle()?;
        self.draft = self.draft.with_certification_toggled(certification);
        Ok(())
    }

    pub fn toggle_certification_by_name(&mut self, name: &str) -> Result<(), WizardError> {
        let certification = name.parse::<Certification>()?;
        self.toggle_certification(certification)
    }

    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_idle()?;
        self.notice = None;

        match self.apply(WizardEvent::Next) {
            Ok(outcome) => {
                self.step = outcome.to;
                self.errors = ValidationErrors::new();
                Ok(self.step)
            }
            Err(error) => Err(self.reject(error, NEXT_BLOCKED_NOTICE)),
        }
    }

    pub fn previous(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_idle()?;
        self.notice = None;

        let outcome = self.apply(WizardEvent::Previous)?;
        self.step = outcome.to;
        Ok(self.step)
    }

    /// Validates the draft and marks a submission as in flight. The returned
    /// snapshot goes to the sink; report the result with [`Self::finish_submit`].
    pub fn begin_submit(&mut self) -> Result<QuoteDraft, WizardError> {
        self.ensure_idle()?;
        self.notice = None;

        match self.apply(WizardEvent::Submit) {
            Ok(_) => {
                self.errors = ValidationErrors::new();
                self.submitting = true;
                Ok(self.draft.clone())
            }
            Err(error) => Err(self.reject(error, SUBMIT_BLOCKED_NOTICE)),
        }
    }

    pub fn finish_submit(
        &mut self,
        result: Result<SubmissionReceipt, SubmissionError>,
    ) -> Result<SubmissionReceipt, WizardError> {
        if !self.submitting {
            return Err(WizardError::NoSubmissionInFlight);
        }
        self.submitting = false;

        match result {
            Ok(receipt) => {
                let outcome = self.apply(WizardEvent::SubmissionSucceeded)?;
                self.step = outcome.to;
                self.draft = QuoteDraft::default();
                self.errors = ValidationErrors::new();
                self.notice = Some(Notice::success(SUBMIT_SUCCESS_NOTICE));
                self.emit_submission(AuditOutcome::Success, Some(&receipt), None);
                info!(
                    event_name = "wizard.submission.succeeded",
                    quote_request_id = %receipt.id,
                    "quote request submitted"
                );
                Ok(receipt)
            }
            Err(error) => {
                self.apply(WizardEvent::SubmissionFailed)?;
                self.notice = Some(Notice::error(SUBMIT_FAILURE_NOTICE));
                self.emit_submission(AuditOutcome::Failed, None, Some(&error));
                warn!(
                    event_name = "wizard.submission.failed",
                    error = %error,
                    "quote request submission failed; draft preserved for retry"
                );
                Err(WizardError::Submission(error))
            }
        }
    }

    /// Hands the draft to the sink. All-or-nothing: on failure the draft and
    /// step are left as they were.
    pub async fn submit(&mut self) -> Result<SubmissionReceipt, WizardError> {
        let draft = self.begin_submit()?;
        let result = self.sink.create(&draft).await;
        self.finish_submit(result)
    }

    pub fn view(&self) -> WizardView {
        WizardView {
            step: self.step.number(),
            step_title: self.step.title(),
            draft: self.draft.clone(),
            line_items: self
                .draft
                .line_items
                .iter()
                .enumerate()
                .map(|(index, item)| LineItemView {
                    index,
                    item: item.clone(),
                    removable: index > 0 && self.draft.line_items.len() > 1,
                })
                .collect(),
            errors: self.errors.clone(),
            notice: self.notice.clone(),
            product_options: self.product_options(),
            certification_options: Certification::CATALOG
                .iter()
                .map(|certification| certification.name())
                .collect(),
            submitting: self.submitting,
            can_go_back: self.can_go_back(),
            can_submit: self.can_submit(),
        }
    }

    fn ensure_idle(&self) -> Result<(), WizardError> {
        if self.submitting {
            return Err(WizardError::SubmissionInFlight);
        }
        Ok(())
    }

    fn apply(&self, event: WizardEvent) -> Result<TransitionOutcome, WizardTransitionError> {
        match &self.audit {
            Some((sink, context)) => {
                self.engine.apply_with_audit(self.step, event, &self.draft, sink.as_ref(), context)
            }
            None => self.engine.apply(self.step, event, &self.draft),
        }
    }

    fn reject(&mut self, error: WizardTransitionError, notice: &str) -> WizardError {
        if let WizardTransitionError::ValidationFailed { errors, .. } = &error {
            self.errors = errors.clone();
            self.notice = Some(Notice::error(notice));
        }
        WizardError::Transition(error)
    }

    fn emit_submission(
        &self,
        outcome: AuditOutcome,
        receipt: Option<&SubmissionReceipt>,
        error: Option<&SubmissionError>,
    ) {
        let Some((sink, context)) = &self.audit else {
            return;
        };

        let event_type = match outcome {
            AuditOutcome::Success => "wizard.submission_succeeded",
            AuditOutcome::Rejected | AuditOutcome::Failed => "wizard.submission_failed",
        };
        let mut event = AuditEvent::new(context, event_type, AuditCategory::Submission, outcome);
        if let Some(receipt) = receipt {
            event = event.with_quote_request(QuoteRequestId(receipt.id.clone()));
        }
        if let Some(error) = error {
            event = event.with_metadata("error", error.to_string());
        }
        sink.emit(event);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemView {
    pub index: usize,
    #[serde(flatten)]
    pub item: LineItem,
    pub removable: bool,
}

/// Serializable snapshot of a wizard session for hosts that render it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub step: u8,
    pub step_title: &'static str,
    pub draft: QuoteDraft,
    pub line_items: Vec<LineItemView>,
    pub errors: ValidationErrors,
    pub notice: Option<Notice>,
    pub product_options: Vec<ProductOption>,
    pub certification_options: Vec<&'static str>,
    pub submitting: bool,
    pub can_go_back: bool,
    pub can_submit: bool,
}
