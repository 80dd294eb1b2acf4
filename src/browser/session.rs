use tracing::info;

use super::proxy::probe_proxy;
use crate::core::config::SessionConfig;
use crate::core::engine::EngineTrait;
use crate::errors::{AutomationError, Result};

/// Scoped owner of the browsing engine for one run.
///
/// Acquisition probes the proxy (when one is configured) before anything is
/// launched; release tears the engine down. The runner releases on every
/// exit path, and engine handles also close on drop, so a panic cannot leak
/// a browser process.
pub struct SessionContext<E: EngineTrait> {
    engine: E,
    released: bool,
}

impl<E: EngineTrait> SessionContext<E> {
    pub async fn acquire(mut engine: E, config: &SessionConfig) -> Result<Self> {
        if let Some(proxy) = &config.proxy {
            if !probe_proxy(proxy).await? {
                return Err(AutomationError::ProxyUnreachable(proxy.server.clone()));
            }
            info!("Routing the browsing session through {}", proxy.server);
        }

        engine.launch(config).await?;

        Ok(Self {
            engine,
            released: false,
        })
    }

    pub async fn new_page(&self) -> Result<E::Page> {
        self.engine.new_page().await
    }

    pub fn is_active(&self) -> bool {
        !self.released && self.engine.is_running()
    }

    /// Releases the engine. Consumes the context, so release happens at most
    /// once per session.
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        self.engine.close().await
    }
}
