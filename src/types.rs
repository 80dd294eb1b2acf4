use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{AutomationError, Result};

/// Account used to sign into the storefront. Supplied once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Upstream proxy the browsing session is routed through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub server: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    /// The server must be a parseable URL (scheme included, e.g.
    /// `http://host:port` or `socks5://127.0.0.1:9050`).
    pub fn new(server: impl Into<String>) -> Result<Self> {
        let server = server.into();
        Url::parse(&server).map_err(|e| {
            AutomationError::Configuration(format!("invalid proxy server '{}': {}", server, e))
        })?;
        Ok(Self {
            server,
            username: None,
            password: None,
        })
    }

    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

/// Handle to the single element a selector resolved to. Leased from the live
/// page for one interaction; any navigation invalidates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: String,
}

impl Locator {
    pub(crate) fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }
}

/// What hover-resolution accepts: a raw selector expression or an already
/// resolved handle (which gets re-verified against the current page).
#[derive(Debug, Clone)]
pub enum Target {
    Selector(String),
    Resolved(Locator),
}

impl Target {
    pub fn selector(&self) -> &str {
        match self {
            Target::Selector(s) => s,
            Target::Resolved(l) => l.selector(),
        }
    }
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Target::Selector(selector.to_string())
    }
}

impl From<String> for Target {
    fn from(selector: String) -> Self {
        Target::Selector(selector)
    }
}

impl From<Locator> for Target {
    fn from(locator: Locator) -> Self {
        Target::Resolved(locator)
    }
}

impl From<&Locator> for Target {
    fn from(locator: &Locator) -> Self {
        Target::Resolved(locator.clone())
    }
}
