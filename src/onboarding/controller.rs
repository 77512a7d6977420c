//! OnboardingController: the surface every onboarding screen talks to.
//!
//! Coordinates the session state, the step registry, and the remote progress
//! service. Remote failures never escape as errors from navigation calls:
//! they become `false` returns or the session `error` field, and the user can
//! always move forward locally.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::model::OnboardingData;
use super::payload::StepPayload;
use super::registry::StepRegistry;
use super::resume::{ResumeAttempt, ResumeOutcome, ResumeProtocol};
use super::state::OnboardingSession;
use crate::api::{ProgressService, ProgressUpdate};
use crate::config::OnboardingConfig;
use crate::error::{OnboardingError, RegistryError};
use crate::identity::IdentityProvider;
use crate::store::{LocalProgress, ProgressStore, keys};

/// Orchestrates step navigation, data collection, and save policy.
pub struct OnboardingController {
    registry: Arc<StepRegistry>,
    service: Arc<dyn ProgressService>,
    store: Option<Arc<dyn ProgressStore>>,
    config: OnboardingConfig,
    session: Arc<RwLock<OnboardingSession>>,
    resume: ResumeProtocol,
    session_id: Uuid,
    /// Pending debounce task, if any.
    sync_timer: Mutex<Option<JoinHandle<()>>>,
    /// Bumped each time a debounce window closes on a non-critical step.
    sync_due: Arc<watch::Sender<u64>>,
    heartbeat_failures: AtomicU32,
    torn_down: AtomicBool,
}

impl OnboardingController {
    /// Create a controller. The configured flow length must match the
    /// registry exactly.
    pub fn new(
        config: OnboardingConfig,
        registry: StepRegistry,
        service: Arc<dyn ProgressService>,
    ) -> Result<Self, RegistryError> {
        registry.validate_total(config.total_steps)?;
        let registry = Arc::new(registry);
        let resume = ResumeProtocol::new(Arc::clone(&registry), Arc::clone(&service), &config);
        let (sync_due, _) = watch::channel(0);
        Ok(Self {
            session: Arc::new(RwLock::new(OnboardingSession::new(config.total_steps))),
            registry,
            service,
            store: None,
            resume,
            session_id: Uuid::new_v4(),
            sync_timer: Mutex::new(None),
            sync_due: Arc::new(sync_due),
            heartbeat_failures: AtomicU32::new(0),
            torn_down: AtomicBool::new(false),
            config,
        })
    }

    /// Attach a local progress cache.
    pub fn with_store(mut self, store: Arc<dyn ProgressStore>) -> Self {
        self.store = Some(store);
        self
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Arm the controller for a (new) screen lifecycle.
    pub fn initialize(&self) {
        self.torn_down.store(false, Ordering::SeqCst);
        self.heartbeat_failures.store(0, Ordering::SeqCst);
        debug!(session_id = %self.session_id, "Onboarding controller initialized");
    }

    /// Cancel any scheduled sync. Nothing fires after this returns.
    ///
    /// Does not reset the resume guard: resume runs once per controller.
    pub fn teardown(&self) {
        self.torn_down.store(true, Ordering::SeqCst);
        self.cancel_sync_timer();
        debug!(session_id = %self.session_id, "Onboarding controller torn down");
    }

    /// Run the resume protocol once for this session and apply its outcome.
    pub async fn resume(&self, identity: &dyn IdentityProvider) -> ResumeAttempt {
        let attempt = self.resume.run(identity).await;
        if let ResumeAttempt::Finished(ref outcome) = attempt {
            self.apply_resume(outcome).await;
        }
        attempt
    }

    /// The resume protocol owned by this controller (for state subscription).
    pub fn resume_protocol(&self) -> &ResumeProtocol {
        &self.resume
    }

    async fn apply_resume(&self, outcome: &ResumeOutcome) {
        {
            let mut session = self.session.write().await;
            session.set_current_step(outcome.step);
            if outcome.is_completed {
                session.complete();
            }
        }
        self.cache_progress(outcome.step).await;
    }

    // ── Reads ───────────────────────────────────────────────────────

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// A copy of the current session state.
    pub async fn snapshot(&self) -> OnboardingSession {
        self.session.read().await.clone()
    }

    pub async fn current_step(&self) -> u32 {
        self.session.read().await.current_step
    }

    pub async fn is_critical_step(&self) -> bool {
        let step = self.current_step().await;
        self.registry.is_critical(step)
    }

    pub async fn is_step_saved(&self, step: u32) -> bool {
        self.session.read().await.is_step_saved(step)
    }

    /// Subscribe to debounce completions. The value is a counter; any change
    /// means a quiet period ended with unsynced non-critical data.
    pub fn subscribe_sync_due(&self) -> watch::Receiver<u64> {
        self.sync_due.subscribe()
    }

    pub fn heartbeat_failures(&self) -> u32 {
        self.heartbeat_failures.load(Ordering::SeqCst)
    }

    /// Best-effort read of the local progress cache.
    pub async fn local_progress(&self) -> Option<LocalProgress> {
        let store = self.store.as_ref()?;
        match store.get(keys::ONBOARDING_PROGRESS).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Failed to read local progress: {}", e);
                None
            }
        }
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Set the current step (screen mount). No bounds check.
    pub async fn set_step(&self, step: u32) {
        self.session.write().await.set_current_step(step);
    }

    /// Override the flow length. Last writer wins, but the flow never
    /// extends past the last registered step.
    pub async fn set_total_steps(&self, total_steps: u32) {
        let registered = self.registry.total();
        if let Err(e) = self.registry.validate_total(total_steps) {
            warn!("Flow length override does not match the step registry: {}", e);
        }
        self.session
            .write()
            .await
            .set_total_steps(total_steps.min(registered));
    }

    /// Save the current step if it is critical and unsaved, then advance.
    ///
    /// A failed save does not block advancement.
    pub async fn go_next(&self) {
        let (step, saved) = {
            let session = self.session.read().await;
            (session.current_step, session.is_step_saved(session.current_step))
        };

        if self.registry.is_critical(step) && !saved && !self.save_critical_data(Some(step)).await
        {
            warn!(step, "Failed to save critical step, allowing progress");
        }

        self.session.write().await.advance();
    }

    pub async fn go_back(&self) {
        self.session.write().await.retreat();
    }

    /// Mark `step` skipped and move past it.
    pub async fn skip_step(&self, step: u32) {
        info!(step, "Step skipped");
        self.session.write().await.skip_step(step);
    }

    pub async fn complete(&self) {
        self.cancel_sync_timer();
        self.session.write().await.complete();
    }

    /// Start over. The local progress cache is cleared too.
    pub async fn reset(&self) {
        self.cancel_sync_timer();
        self.session.write().await.reset();
        self.clear_cached_progress().await;
    }

    // ── Heartbeat ───────────────────────────────────────────────────

    /// Write the step pointer remotely so a killed app resumes here.
    ///
    /// Returns whether the write succeeded; callers ignore failures. Repeated
    /// failures raise a diagnostic event once per `heartbeat_alert_after`.
    pub async fn save_current_step_number(&self, step: u32) -> bool {
        let Some(category) = self.registry.category(step) else {
            error!(step, "No backend category registered for step");
            return false;
        };

        match self
            .service
            .update_progress(&ProgressUpdate::new(step, category))
            .await
        {
            Ok(()) => {
                self.heartbeat_failures.store(0, Ordering::SeqCst);
                debug!(step, %category, "Heartbeat saved");
                self.cache_progress(step).await;
                true
            }
            Err(e) => {
                let failures = self.heartbeat_failures.fetch_add(1, Ordering::SeqCst) + 1;
                warn!(step, failures, "Heartbeat failed: {}", e);
                if failures % self.config.heartbeat_alert_after.max(1) == 0 {
                    error!(
                        target: "onboarding::diagnostics",
                        consecutive_failures = failures,
                        last_error = %e,
                        "Onboarding heartbeat writes are failing repeatedly"
                    );
                }
                false
            }
        }
    }

    async fn cache_progress(&self, step: u32) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let total = self.session.read().await.total_steps;
        let record = LocalProgress::new(self.session_id, step, total);
        if let Err(e) = store.set(keys::ONBOARDING_PROGRESS, &record).await {
            warn!(step, "Failed to cache progress locally: {}", e);
        }
    }

    async fn clear_cached_progress(&self) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        if let Err(e) = store.delete(keys::ONBOARDING_PROGRESS).await {
            warn!("Failed to clear local progress: {}", e);
        }
    }

    // ── Form data ───────────────────────────────────────────────────

    /// Merge `patch` into the form data and restart the debounce window.
    pub async fn update_form_data(&self, patch: OnboardingData) {
        self.session.write().await.merge_form_data(patch);
        if !self.torn_down.load(Ordering::SeqCst) {
            self.schedule_sync();
        }
    }

    /// Replace any pending debounce task with a fresh one.
    fn schedule_sync(&self) {
        let session = Arc::clone(&self.session);
        let registry = Arc::clone(&self.registry);
        let sync_due = Arc::clone(&self.sync_due);
        let debounce = self.config.debounce;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let step = {
                let mut session = session.write().await;
                if registry.is_critical(session.current_step) {
                    return;
                }
                session.set_sync_pending(true);
                session.current_step
            };
            debug!(step, "Form data sync due");
            sync_due.send_modify(|n| *n += 1);
        });

        let mut timer = self.sync_timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = timer.replace(handle) {
            previous.abort();
        }
    }

    fn cancel_sync_timer(&self) {
        let mut timer = self.sync_timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = timer.take() {
            handle.abort();
        }
    }

    // ── Saving ──────────────────────────────────────────────────────

    /// Persist the critical data of `step` (default: current step).
    ///
    /// Non-critical steps succeed immediately without a network call. No
    /// internal retry: on `false` the screen offers retry or skip.
    pub async fn save_critical_data(&self, step: Option<u32>) -> bool {
        let step = match step {
            Some(step) => step,
            None => self.current_step().await,
        };
        if !self.registry.is_critical(step) {
            return true;
        }
        match self.persist_step(step).await {
            Ok(()) => true,
            Err(e) => {
                error!(step, "Failed to save critical step: {}", e);
                false
            }
        }
    }

    /// Write one step's data. The step is marked saved only after the
    /// backend acknowledges the write.
    async fn persist_step(&self, step: u32) -> Result<(), OnboardingError> {
        let kind = self
            .registry
            .persists(step)
            .ok_or(OnboardingError::NothingToSave { step })?;

        let payload = {
            let mut session = self.session.write().await;
            let payload = StepPayload::build(kind, &session.form_data)
                .ok_or(OnboardingError::NothingToSave { step })?;
            session.set_loading(true);
            session.set_error(None);
            payload
        };

        let result = self.service.save_step_data(&payload).await;

        let is_current = {
            let mut session = self.session.write().await;
            session.set_loading(false);
            match result {
                Ok(()) => {
                    session.mark_step_saved(step);
                    session.current_step == step
                }
                Err(e) => {
                    session.set_error(Some(e.to_string()));
                    return Err(OnboardingError::Submission(e));
                }
            }
        };

        info!(step, endpoint = payload.endpoint(), "Step data saved");

        // Only move the remote pointer forward to where the user actually is.
        if !is_current {
            return Ok(());
        }
        if let Some(category) = self.registry.category(step) {
            if let Err(e) = self
                .service
                .update_progress(&ProgressUpdate::new(step, category))
                .await
            {
                warn!(step, "Failed to update progress after save: {}", e);
            }
        }
        Ok(())
    }

    /// Persist every unsaved step up to the current one that has data.
    ///
    /// Hosts call this at lifecycle points (app backgrounding, before
    /// teardown). Returns the number of steps written. `pending_sync` stays
    /// raised while any attempted write failed, so the next flush retries it.
    pub async fn flush_pending_sync(&self) -> usize {
        let candidates: Vec<u32> = {
            let session = self.session.read().await;
            if !session.pending_sync {
                return 0;
            }
            (1..=session.current_step.min(self.registry.total()))
                .filter(|step| !session.is_step_saved(*step))
                .filter(|step| {
                    self.registry
                        .persists(*step)
                        .and_then(|kind| StepPayload::build(kind, &session.form_data))
                        .is_some()
                })
                .collect()
        };

        let mut written = 0;
        let mut failed = 0;
        for step in candidates {
            match self.persist_step(step).await {
                Ok(()) => written += 1,
                Err(e) => {
                    failed += 1;
                    warn!(step, "Background sync failed: {}", e);
                }
            }
        }

        // A successful write clears the flag; re-raise it for the failures.
        self.session.write().await.set_sync_pending(failed > 0);
        info!(written, failed, "Pending sync flushed");
        written
    }

    /// Final submission: write every collected section, mark onboarding
    /// complete remotely, then complete locally.
    pub async fn submit(&self) -> Result<(), OnboardingError> {
        let writes = {
            let mut session = self.session.write().await;
            session.set_loading(true);
            session.set_error(None);
            StepPayload::final_submission(&session.form_data)
        };

        let result = async {
            for payload in &writes {
                self.service.save_step_data(payload).await?;
            }
            self.service.complete_onboarding().await
        }
        .await;

        let mut session = self.session.write().await;
        session.set_loading(false);
        match result {
            Ok(()) => {
                session.complete();
                drop(session);
                self.cancel_sync_timer();
                self.clear_cached_progress().await;
                info!("Onboarding submitted");
                Ok(())
            }
            Err(e) => {
                error!("Failed to submit onboarding: {}", e);
                session.set_error(Some(e.to_string()));
                Err(OnboardingError::Submission(e))
            }
        }
    }
}

impl Drop for OnboardingController {
    fn drop(&mut self) {
        self.cancel_sync_timer();
    }
}
