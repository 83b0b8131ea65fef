pub mod onboarding_flow;
pub mod record_ctx;

pub use onboarding_flow::{DocumentSettings, OnboardingFlow, RecordOutcome};
pub use record_ctx::RecordCtx;
