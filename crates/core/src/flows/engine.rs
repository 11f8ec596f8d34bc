use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::quote_request::QuoteDraft;
use crate::flows::states::{TransitionOutcome, WizardAction, WizardEvent, WizardStep};
use crate::validation::{
    validate_contact_step, validate_project_step, validate_requirements_step, ValidationErrors,
};

/// Pure check of the draft fields owned by one step.
pub type StepValidator = fn(&QuoteDraft) -> ValidationErrors;

pub trait WizardDefinition {
    fn initial_step(&self) -> WizardStep;
    fn validator(&self, step: WizardStep) -> StepValidator;
    fn transition(
        &self,
        current: WizardStep,
        event: WizardEvent,
        draft: &QuoteDraft,
    ) -> Result<TransitionOutcome, WizardTransitionError>;
}

#[derive(Clone, Debug, Default)]
pub struct QuoteRequestFlow;

impl WizardDefinition for QuoteRequestFlow {
    fn initial_step(&self) -> WizardStep {
        WizardStep::Contact
    }

    fn validator(&self, step: WizardStep) -> StepValidator {
        match step {
            WizardStep::Contact => validate_contact_step,
            WizardStep::Project => validate_project_step,
            // Review has no inputs; submission re-checks the requirements rules.
            WizardStep::Requirements | WizardStep::Review => validate_requirements_step,
        }
    }

    fn transition(
        &self,
        current: WizardStep,
        event: WizardEvent,
        draft: &QuoteDraft,
    ) -> Result<TransitionOutcome, WizardTransitionError> {
        transition_quote_request(self, current, event, draft)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WizardTransitionError {
    #[error("step {step:?} failed validation for {} field(s)", errors.len())]
    ValidationFailed { step: WizardStep, errors: ValidationErrors },
    #[error("invalid transition from {step:?} using event {event:?}")]
    InvalidTransition { step: WizardStep, event: WizardEvent },
}

impl WizardTransitionError {
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::ValidationFailed { errors, .. } => Some(errors),
            Self::InvalidTransition { .. } => None,
        }
    }
}

pub struct WizardEngine<F> {
    flow: F,
}

impl<F> WizardEngine<F>
where
    F: WizardDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_step(&self) -> WizardStep {
        self.flow.initial_step()
    }

    pub fn validate(&self, step: WizardStep, draft: &QuoteDraft) -> ValidationErrors {
        (self.flow.validator(step))(draft)
    }

    pub fn apply(
        &self,
        current: WizardStep,
        event: WizardEvent,
        draft: &QuoteDraft,
    ) -> Result<TransitionOutcome, WizardTransitionError> {
        self.flow.transition(current, event, draft)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: WizardStep,
        event: WizardEvent,
        draft: &QuoteDraft,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, WizardTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event, draft);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "wizard.transition_applied",
                        AuditCategory::Wizard,
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", format!("{:?}", outcome.from))
                    .with_metadata("to", format!("{:?}", outcome.to))
                    .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                let mut event = AuditEvent::new(
                    audit,
                    "wizard.transition_rejected",
                    AuditCategory::Wizard,
                    AuditOutcome::Rejected,
                )
                .with_metadata("error", error.to_string());
                if let Some(errors) = error.validation_errors() {
                    event = event.with_metadata("fields", errors.fields().collect::<Vec<_>>().join(","));
                }
                sink.emit(event);
            }
        }
        result
    }
}

impl Default for WizardEngine<QuoteRequestFlow> {
    fn default() -> Self {
        Self::new(QuoteRequestFlow)
    }
}

fn transition_quote_request(
    flow: &QuoteRequestFlow,
    current: WizardStep,
    event: WizardEvent,
    draft: &QuoteDraft,
) -> Result<TransitionOutcome, WizardTransitionError> {
    use WizardAction::{PersistQuoteRequest, ResetDraft};
    use WizardEvent::{Next, Previous, Submit, SubmissionFailed, SubmissionSucceeded};
    use WizardStep::{Contact, Review};

    let invalid = || WizardTransitionError::InvalidTransition { step: current, event };
    let gate = || {
        let errors = flow.validator(current)(draft);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(WizardTransitionError::ValidationFailed { step: current, errors })
        }
    };

    let (to, actions) = match (current, event) {
        (Review, Next) => return Err(invalid()),
        (_, Next) => {
            gate()?;
            (current.next().ok_or_else(invalid)?, Vec::new())
        }
        (_, Previous) => (current.previous().ok_or_else(invalid)?, Vec::new()),
        (Review, Submit) => {
            gate()?;
            (Review, vec![PersistQuoteRequest])
        }
        (Review, SubmissionSucceeded) => (Contact, vec![ResetDraft]),
        (Review, SubmissionFailed) => (Review, Vec::new()),
        _ => return Err(invalid()),
    };

    Ok(TransitionOutcome { from: current, to, event, actions })
}
