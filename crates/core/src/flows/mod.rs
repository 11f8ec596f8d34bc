pub mod engine;
pub mod review;
pub mod states;
pub mod wizard;

pub use engine::{QuoteRequestFlow, StepValidator, WizardDefinition, WizardEngine, WizardTransitionError};
pub use review::{ReviewLine, ReviewSummary};
pub use states::{Notice, NoticeLevel, TransitionOutcome, WizardAction, WizardEvent, WizardStep};
pub use wizard::{LineItemView, QuoteWizard, WizardError, WizardView};
