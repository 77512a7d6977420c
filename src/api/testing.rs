//! In-memory `ProgressService` for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{OnboardingStatus, ProgressRecord, ProgressService, ProgressUpdate};
use crate::error::ApiError;
use crate::onboarding::payload::StepPayload;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    FetchStatus,
    UpdateProgress(ProgressUpdate),
    SaveStepData(StepPayload),
    Complete,
}

/// Records every call; each operation can be switched to fail.
#[derive(Default)]
pub(crate) struct MockProgressService {
    pub calls: Mutex<Vec<Call>>,
    pub status: Mutex<Option<OnboardingStatus>>,
    pub fail_status: AtomicBool,
    pub fail_progress: AtomicBool,
    pub fail_step_data: AtomicBool,
    pub fail_complete: AtomicBool,
    pub status_fetches: AtomicUsize,
    /// Endpoints that fail regardless of the per-operation switches.
    pub failing_endpoints: Mutex<Vec<&'static str>>,
}

impl MockProgressService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: ProgressRecord) -> Self {
        let mock = Self::new();
        *mock.status.lock().unwrap() = Some(OnboardingStatus {
            onboarding_progress: Some(record),
        });
        mock
    }

    pub fn fail_endpoint(&self, endpoint: &'static str) {
        self.failing_endpoints.lock().unwrap().push(endpoint);
    }

    pub fn clear_failures(&self) {
        self.failing_endpoints.lock().unwrap().clear();
    }

    fn endpoint_fails(&self, endpoint: &str) -> bool {
        self.failing_endpoints
            .lock()
            .unwrap()
            .iter()
            .any(|e| *e == endpoint)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn step_data_calls(&self) -> Vec<StepPayload> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SaveStepData(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn progress_calls(&self) -> Vec<ProgressUpdate> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::UpdateProgress(u) => Some(u),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn fail(endpoint: &str) -> ApiError {
        ApiError::Http {
            endpoint: endpoint.to_string(),
            status: 503,
            message: "unavailable".to_string(),
        }
    }
}

#[async_trait]
impl ProgressService for MockProgressService {
    async fn fetch_status(&self) -> Result<OnboardingStatus, ApiError> {
        self.record(Call::FetchStatus);
        self.status_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(Self::fail("/onboarding/status"));
        }
        Ok(self.status.lock().unwrap().clone().unwrap_or_default())
    }

    async fn update_progress(&self, update: &ProgressUpdate) -> Result<(), ApiError> {
        self.record(Call::UpdateProgress(update.clone()));
        if self.fail_progress.load(Ordering::SeqCst) {
            return Err(Self::fail("/onboarding/progress"));
        }
        Ok(())
    }

    async fn save_step_data(&self, payload: &StepPayload) -> Result<(), ApiError> {
        self.record(Call::SaveStepData(payload.clone()));
        if self.fail_step_data.load(Ordering::SeqCst) || self.endpoint_fails(payload.endpoint()) {
            return Err(Self::fail(payload.endpoint()));
        }
        Ok(())
    }

    async fn complete_onboarding(&self) -> Result<(), ApiError> {
        self.record(Call::Complete);
        if self.fail_complete.load(Ordering::SeqCst) {
            return Err(Self::fail("/onboarding/complete"));
        }
        Ok(())
    }
}
