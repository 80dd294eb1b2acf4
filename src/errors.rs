use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Proxy unreachable: {0}")]
    ProxyUnreachable(String),

    #[error("Selector '{selector}' resolved to {count} elements, expected exactly 1")]
    StrictResolution { selector: String, count: usize },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Network failure: {0}")]
    Network(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Screenshot failed: {0}")]
    Screenshot(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AutomationError>;

// Convert anyhow::Error to AutomationError
impl From<anyhow::Error> for AutomationError {
    fn from(err: anyhow::Error) -> Self {
        AutomationError::Engine(err.to_string())
    }
}

impl AutomationError {
    /// Failures likely to succeed on an unmodified re-attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AutomationError::Timeout(_)
                | AutomationError::Network(_)
                | AutomationError::Navigation(_)
                | AutomationError::Engine(_)
        )
    }

    /// Network-origin failures are reported separately in run summaries.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            AutomationError::Timeout(_) | AutomationError::Network(_)
        )
    }

    /// Classify a raw engine message; connection-level failures become Network.
    pub fn from_engine_message(msg: String) -> Self {
        if msg.contains("net::") || msg.contains("ERR_") || msg.contains("connection") {
            AutomationError::Network(msg)
        } else {
            AutomationError::Engine(msg)
        }
    }
}
