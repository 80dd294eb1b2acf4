use async_trait::async_trait;

use crate::automation::summary::RunSummary;
use crate::errors::Result;

/// Capability contract for one target site's automation. New sites add new
/// implementations, not new inheritance levels.
#[async_trait]
pub trait SiteAutomation: Send {
    /// Open the site and wait for it to settle. Failures here are fatal to
    /// the run; setup is never retried.
    async fn setup(&mut self) -> Result<()>;

    /// Authenticate with the credentials supplied at construction. Safe to
    /// re-invoke from the start, which the retry wrapper relies on.
    async fn login(&mut self) -> Result<()>;

    /// The full post-login action sequence. Also safe to re-invoke from the
    /// start; all page-derived state is re-read on entry.
    async fn perform_actions(&mut self) -> Result<()>;

    /// Capture and persist a named checkpoint of the current page.
    async fn screenshot(&mut self, step: &str) -> Result<()>;

    /// Snapshot of the per-phase outcomes accumulated so far.
    fn summary(&self) -> RunSummary;
}
