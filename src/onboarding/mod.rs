//! Onboarding system: multi-step profile collection for a new user.
//!
//! A fixed sequence of screens collects identity, body measurements, and
//! training preferences. A handful of steps are critical: their data is
//! written to the backend before the user moves on. Everything else is
//! synced opportunistically. On launch the resume protocol puts a returning
//! user back on the screen they left.

pub mod controller;
pub mod model;
pub mod payload;
pub mod registry;
pub mod resume;
pub mod state;

pub use controller::OnboardingController;
pub use model::{BodyMeasurements, Gender, IdentityFields, OnboardingData, TrainingPreferences};
pub use payload::{PayloadKind, StepPayload};
pub use registry::{BackendCategory, StepDescriptor, StepRegistry};
pub use resume::{ResumeAttempt, ResumeOutcome, ResumeProtocol, ResumeState, ResumeTarget};
pub use state::OnboardingSession;
