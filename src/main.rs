use std::path::Path;
use std::sync::Arc;

use secrecy::SecretString;
use stride_onboarding::api::{HttpProgressClient, ProgressService};
use stride_onboarding::config::OnboardingConfig;
use stride_onboarding::identity::{IdentityProvider, StaticIdentity};
use stride_onboarding::onboarding::{
    OnboardingController, ResumeAttempt, ResumeTarget, StepRegistry,
};
use stride_onboarding::store::{LibSqlStore, ProgressStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = OnboardingConfig::from_env();
    config.validate()?;

    eprintln!("Stride onboarding v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: {}", config.api_base_url);
    eprintln!("   Progress cache: {}", config.db_path);

    // ── Identity ─────────────────────────────────────────────────────────
    let token = std::env::var("STRIDE_TOKEN").ok().map(SecretString::from);
    if token.is_none() {
        eprintln!("   STRIDE_TOKEN not set, running signed out");
    }
    let identity: Arc<dyn IdentityProvider> = Arc::new(StaticIdentity::new(token));

    // ── Local cache ──────────────────────────────────────────────────────
    let store: Arc<dyn ProgressStore> =
        Arc::new(LibSqlStore::new_local(Path::new(&config.db_path)).await?);

    // ── Controller ───────────────────────────────────────────────────────
    let service: Arc<dyn ProgressService> =
        Arc::new(HttpProgressClient::new(&config, Arc::clone(&identity))?);
    let controller = OnboardingController::new(config, StepRegistry::standard(), service)?
        .with_store(store);
    controller.initialize();

    if let Some(cached) = controller.local_progress().await {
        tracing::info!(
            step = cached.step,
            total = cached.total,
            "Last cached onboarding position"
        );
    }

    match controller.resume(identity.as_ref()).await {
        ResumeAttempt::Finished(outcome) => {
            match &outcome.target {
                ResumeTarget::Welcome => println!("welcome"),
                ResumeTarget::Step { step, route } => println!("step {step}: {route}"),
                ResumeTarget::PostOnboarding => println!("onboarding complete"),
            }
            if outcome.degraded {
                eprintln!("   (resumed from the first step after a fallback)");
            }
        }
        ResumeAttempt::NotReady | ResumeAttempt::AlreadyRan => {
            eprintln!("Resume did not run");
        }
    }

    controller.teardown();
    Ok(())
}
