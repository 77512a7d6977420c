//! Resume protocol: positions a returning user at their last known step.
//!
//! Runs at most once per owner. Progresses
//! NotStarted → CheckingAuth → (GoToWelcome | AwaitingToken →
//! FetchingProgress → Resolved | Failed) → Done, and every path reaches
//! `Done`: failures degrade to the first step instead of stalling startup.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use secrecy::SecretString;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::registry::StepRegistry;
use crate::api::{ProgressRecord, ProgressService};
use crate::config::OnboardingConfig;
use crate::identity::IdentityProvider;

/// Where the protocol is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeState {
    NotStarted,
    CheckingAuth,
    GoToWelcome,
    AwaitingToken,
    FetchingProgress,
    Resolved,
    Failed,
    Done,
}

impl ResumeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl std::fmt::Display for ResumeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::CheckingAuth => "checking_auth",
            Self::GoToWelcome => "go_to_welcome",
            Self::AwaitingToken => "awaiting_token",
            Self::FetchingProgress => "fetching_progress",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}

/// Navigation instruction produced by a resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeTarget {
    /// Unauthenticated entry screen.
    Welcome,
    /// An onboarding screen.
    Step { step: u32, route: String },
    /// Onboarding is done; leave the flow.
    PostOnboarding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeOutcome {
    pub target: ResumeTarget,
    /// Step the session should be positioned at.
    pub step: u32,
    pub is_completed: bool,
    /// True when a fallback was taken instead of a precise resume.
    pub degraded: bool,
}

/// Result of asking the protocol to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeAttempt {
    /// The identity provider is still loading; try again later.
    NotReady,
    /// Already ran for this session.
    AlreadyRan,
    Finished(ResumeOutcome),
}

/// One-shot resume state machine.
pub struct ResumeProtocol {
    registry: Arc<StepRegistry>,
    service: Arc<dyn ProgressService>,
    token_attempts: u32,
    token_interval: Duration,
    has_run: AtomicBool,
    state: watch::Sender<ResumeState>,
}

impl ResumeProtocol {
    pub fn new(
        registry: Arc<StepRegistry>,
        service: Arc<dyn ProgressService>,
        config: &OnboardingConfig,
    ) -> Self {
        let (state, _) = watch::channel(ResumeState::NotStarted);
        Self {
            registry,
            service,
            token_attempts: config.token_attempts.max(1),
            token_interval: config.token_interval,
            has_run: AtomicBool::new(false),
            state,
        }
    }

    pub fn state(&self) -> ResumeState {
        *self.state.borrow()
    }

    /// Watch state changes; `Done` is the readiness signal for dismissing a
    /// splash screen.
    pub fn subscribe(&self) -> watch::Receiver<ResumeState> {
        self.state.subscribe()
    }

    pub fn has_run(&self) -> bool {
        self.has_run.load(Ordering::SeqCst)
    }

    fn transition(&self, next: ResumeState) {
        debug!(from = %self.state(), to = %next, "Resume state transition");
        self.state.send_replace(next);
    }

    /// Run the protocol if the identity provider is ready and it has not run
    /// yet.
    pub async fn run(&self, identity: &dyn IdentityProvider) -> ResumeAttempt {
        if !identity.is_loaded() {
            return ResumeAttempt::NotReady;
        }
        if self.has_run.swap(true, Ordering::SeqCst) {
            return ResumeAttempt::AlreadyRan;
        }

        self.transition(ResumeState::CheckingAuth);
        let outcome = if identity.is_signed_in() {
            self.resume_signed_in(identity).await
        } else {
            info!("User not signed in, routing to welcome");
            self.transition(ResumeState::GoToWelcome);
            ResumeOutcome {
                target: ResumeTarget::Welcome,
                step: 1,
                is_completed: false,
                degraded: false,
            }
        };

        self.transition(ResumeState::Done);
        ResumeAttempt::Finished(outcome)
    }

    async fn resume_signed_in(&self, identity: &dyn IdentityProvider) -> ResumeOutcome {
        self.transition(ResumeState::AwaitingToken);
        if self.await_token(identity).await.is_none() {
            warn!(
                attempts = self.token_attempts,
                "No auth token available, starting at the first step"
            );
            self.transition(ResumeState::Failed);
            return self.fallback();
        }

        self.transition(ResumeState::FetchingProgress);
        match self.service.fetch_status().await {
            Ok(status) => {
                let outcome = self.resolve(status.onboarding_progress.unwrap_or_default());
                self.transition(ResumeState::Resolved);
                outcome
            }
            Err(e) => {
                warn!("Failed to fetch onboarding progress, starting fresh: {}", e);
                self.transition(ResumeState::Failed);
                self.fallback()
            }
        }
    }

    /// Poll for a token: exactly `token_attempts` calls, `token_interval`
    /// apart.
    async fn await_token(&self, identity: &dyn IdentityProvider) -> Option<SecretString> {
        for attempt in 1..=self.token_attempts {
            if let Some(token) = identity.get_token().await {
                return Some(token);
            }
            debug!(attempt, "Waiting for auth token");
            if attempt < self.token_attempts {
                tokio::time::sleep(self.token_interval).await;
            }
        }
        None
    }

    /// Map a remote record onto a target. The frontend step pointer is
    /// authoritative; completion overrides it.
    fn resolve(&self, record: ProgressRecord) -> ResumeOutcome {
        if record.is_completed {
            info!("Onboarding already completed");
            return ResumeOutcome {
                target: ResumeTarget::PostOnboarding,
                step: self.registry.total(),
                is_completed: true,
                degraded: false,
            };
        }

        let pointer = record.current_frontend_step.as_deref();
        match pointer.and_then(|p| self.registry.resolve(p)) {
            Some(desc) => {
                info!(step = desc.step, route = %desc.route, "Resuming onboarding");
                ResumeOutcome {
                    target: ResumeTarget::Step {
                        step: desc.step,
                        route: desc.route.clone(),
                    },
                    step: desc.step,
                    is_completed: false,
                    degraded: false,
                }
            }
            None => {
                warn!(
                    pointer = ?pointer,
                    "No usable saved step, starting from the beginning"
                );
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> ResumeOutcome {
        let first = self.registry.first();
        ResumeOutcome {
            target: ResumeTarget::Step {
                step: first.step,
                route: first.route.clone(),
            },
            step: first.step,
            is_completed: false,
            degraded: true,
        }
    }
}
