pub mod base;
pub mod selectors;
pub mod storefront;
pub mod summary;

pub use base::SiteAutomation;
pub use selectors::SelectorSet;
pub use storefront::StorefrontAutomation;
pub use summary::{PhaseOutcome, RunSummary};

use std::time::Instant;

use tracing::{error, info, warn};

use crate::browser::session::SessionContext;
use crate::core::config::SessionConfig;
use crate::core::engine::EngineTrait;
use crate::errors::Result;
use crate::retry::RetryPolicy;

/// Drives one automation run inside a scoped browsing session.
///
/// The session is released on every exit path, and the run summary is
/// emitted whether the run succeeds or fails. On failure a diagnostic
/// screenshot is attempted before the error surfaces.
pub async fn run_session<E, A, F>(
    engine: E,
    session_config: &SessionConfig,
    make_automation: F,
) -> Result<RunSummary>
where
    E: EngineTrait,
    A: SiteAutomation,
    F: FnOnce(E::Page) -> A,
{
    let started = Instant::now();
    let session = SessionContext::acquire(engine, session_config).await?;

    let outcome = match session.new_page().await {
        Ok(page) => {
            let mut automation = make_automation(page);
            let drive_result = drive(&mut automation).await;

            if drive_result.is_err() {
                if let Err(err) = automation.screenshot("error").await {
                    warn!("Failed to capture diagnostic screenshot: {}", err);
                }
            }

            let mut summary = automation.summary();
            summary.finalize(started.elapsed());
            info!("{}", summary.report());

            drive_result.map(|_| summary)
        }
        Err(err) => Err(err),
    };

    if let Err(err) = session.release().await {
        error!("Failed to release the browsing session: {}", err);
    }

    outcome
}

async fn drive<A: SiteAutomation>(automation: &mut A) -> Result<()> {
    let policy = RetryPolicy::default();
    automation.setup().await?;
    policy.run("login", automation, |a| a.login()).await?;
    policy
        .run("perform_actions", automation, |a| a.perform_actions())
        .await?;
    Ok(())
}
