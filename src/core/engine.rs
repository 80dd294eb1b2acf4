use async_trait::async_trait;

use crate::core::config::SessionConfig;
use crate::core::page::PageDriver;
use crate::errors::Result;

/// The rendering engine behind a browsing session.
#[async_trait]
pub trait EngineTrait: Send + Sync {
    type Page: PageDriver;

    /// Launch the underlying browser instance.
    async fn launch(&mut self, config: &SessionConfig) -> Result<()>;

    /// Open a fresh page in the running instance.
    async fn new_page(&self) -> Result<Self::Page>;

    fn is_running(&self) -> bool;

    /// Tear the instance down. Idempotent.
    async fn close(&mut self) -> Result<()>;
}
