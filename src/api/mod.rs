//! Remote Progress Service: the backend endpoints onboarding reads and
//! writes.
//!
//! `ProgressService` is the seam the controller and resume protocol talk to;
//! `HttpProgressClient` is the production implementation.

mod http;
#[cfg(test)]
pub(crate) mod testing;

pub use http::HttpProgressClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::onboarding::payload::StepPayload;
use crate::onboarding::registry::BackendCategory;

/// `PUT /onboarding/progress` body.
///
/// Both fields are always sent together, so two writes for the same step are
/// byte-identical regardless of which one lands last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub current_step: BackendCategory,
    pub current_frontend_step: String,
}

impl ProgressUpdate {
    pub fn new(step: u32, category: BackendCategory) -> Self {
        Self {
            current_step: category,
            current_frontend_step: step.to_string(),
        }
    }
}

/// Remote progress record, as returned by `GET /onboarding/status`.
///
/// `current_step` is kept as a raw string so an unknown category from a newer
/// backend does not fail the whole read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    pub current_step: Option<String>,
    /// Precise resume pointer; the source of truth for resumption.
    #[serde(default)]
    pub current_frontend_step: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingStatus {
    #[serde(default)]
    pub onboarding_progress: Option<ProgressRecord>,
}

/// Standard `{ success, data?, error? }` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Backend operations the onboarding subsystem depends on.
#[async_trait]
pub trait ProgressService: Send + Sync {
    /// `GET /onboarding/status`
    async fn fetch_status(&self) -> Result<OnboardingStatus, ApiError>;

    /// `PUT /onboarding/progress`. Partial and idempotent.
    async fn update_progress(&self, update: &ProgressUpdate) -> Result<(), ApiError>;

    /// Write one step's critical data to its endpoint.
    async fn save_step_data(&self, payload: &StepPayload) -> Result<(), ApiError>;

    /// `POST /onboarding/complete`
    async fn complete_onboarding(&self) -> Result<(), ApiError>;
}
