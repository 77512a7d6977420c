//! Onboarding session state: where the user is in the flow and what has
//! been collected and confirmed so far.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::OnboardingData;

/// In-memory onboarding state for one app session.
///
/// All mutations are synchronous. Bounds on `current_step` are maintained by
/// `advance`/`retreat`; `set_current_step` is an unconditional overwrite and
/// callers are responsible for passing a registered step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingSession {
    /// 1-indexed position in the flow.
    pub current_step: u32,
    pub total_steps: u32,
    pub is_completed: bool,
    /// Steps explicitly bypassed. Informational only.
    pub skipped_steps: BTreeSet<u32>,
    pub form_data: OnboardingData,
    /// Steps whose critical data the backend has acknowledged.
    pub saved_steps: BTreeSet<u32>,
    pub last_saved_at: Option<DateTime<Utc>>,
    /// Form data changed since the last successful sync.
    pub pending_sync: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl OnboardingSession {
    pub fn new(total_steps: u32) -> Self {
        Self {
            current_step: 1,
            total_steps: total_steps.max(1),
            is_completed: false,
            skipped_steps: BTreeSet::new(),
            form_data: OnboardingData::default(),
            saved_steps: BTreeSet::new(),
            last_saved_at: None,
            pending_sync: false,
            is_loading: false,
            error: None,
        }
    }

    pub fn set_current_step(&mut self, step: u32) {
        self.current_step = step;
    }

    /// Move forward one step; no-op at the last step.
    pub fn advance(&mut self) {
        if self.current_step < self.total_steps {
            self.current_step += 1;
        }
    }

    /// Move back one step; no-op at step 1.
    pub fn retreat(&mut self) {
        if self.current_step > 1 {
            self.current_step -= 1;
        }
    }

    /// Record `step` as skipped and move past it.
    pub fn skip_step(&mut self, step: u32) {
        self.skipped_steps.insert(step);
        self.advance();
    }

    /// Last writer wins. The current step is pulled down if it would fall
    /// outside the new range.
    pub fn set_total_steps(&mut self, total_steps: u32) {
        self.total_steps = total_steps.max(1);
        if self.current_step > self.total_steps {
            self.current_step = self.total_steps;
        }
    }

    pub fn merge_form_data(&mut self, patch: OnboardingData) {
        self.form_data.merge(patch);
        self.pending_sync = true;
    }

    pub fn mark_step_saved(&mut self, step: u32) {
        self.saved_steps.insert(step);
        self.last_saved_at = Some(Utc::now());
        self.pending_sync = false;
    }

    pub fn is_step_saved(&self, step: u32) -> bool {
        self.saved_steps.contains(&step)
    }

    pub fn set_sync_pending(&mut self, pending: bool) {
        self.pending_sync = pending;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    /// Terminal transition.
    pub fn complete(&mut self) {
        self.is_completed = true;
        self.current_step = self.total_steps;
        self.pending_sync = false;
    }

    /// Back to a fresh session. The flow length is kept.
    pub fn reset(&mut self) {
        *self = Self::new(self.total_steps);
    }
}
