//! Onboarding wizard: step sequencing, the form store, submission, and the
//! HTTP surface that drives them.

pub mod form_store;
pub mod routes;
pub mod sequencer;
pub mod shell;
pub mod snapshot;
pub mod submission;

pub use form_store::{FormStatus, FormStore, StepOutcome, SubmitOutcome};
pub use routes::{OnboardingRouteState, onboarding_routes};
pub use sequencer::{CompletedSteps, Sequencer, Step};
pub use shell::{ProceedOutcome, WizardShell, WizardView};
pub use submission::{ApplicationIntake, ApplicationSummary, IntakeReceipt, StubIntake};
