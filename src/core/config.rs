use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{AutomationError, Result};
use crate::types::{Credentials, ProxyConfig};

/// Delay ranges the behavior simulator draws from. Both ranges must be
/// non-empty and strictly ordered; `validate` is called before a run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationTuning {
    pub min_action_delay: Duration,
    pub max_action_delay: Duration,
    pub min_typing_delay: Duration,
    pub max_typing_delay: Duration,
}

impl Default for SimulationTuning {
    fn default() -> Self {
        Self {
            min_action_delay: Duration::from_millis(1000),
            max_action_delay: Duration::from_millis(3000),
            min_typing_delay: Duration::from_millis(100),
            max_typing_delay: Duration::from_millis(300),
        }
    }
}

impl SimulationTuning {
    pub fn validate(&self) -> Result<()> {
        let pairs = [
            ("action delay", self.min_action_delay, self.max_action_delay),
            ("typing delay", self.min_typing_delay, self.max_typing_delay),
        ];
        for (label, min, max) in pairs {
            if min.is_zero() {
                return Err(AutomationError::Configuration(format!(
                    "{} minimum must be positive",
                    label
                )));
            }
            if min >= max {
                return Err(AutomationError::Configuration(format!(
                    "{} range is invalid: min {:?} must be below max {:?}",
                    label, min, max
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Engine-level settings for one browsing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub proxy: Option<ProxyConfig>,
    pub user_agent: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            proxy: None,
            user_agent: None,
        }
    }
}

/// Everything one automation run needs beyond the engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub base_url: String,
    pub credentials: Option<Credentials>,
    /// How many products to interact with; unset means a random 1..=3.
    pub num_products: Option<usize>,
    pub tuning: SimulationTuning,
    pub screenshot_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.saucedemo.com".to_string(),
            credentials: None,
            num_products: None,
            tuning: SimulationTuning::default(),
            screenshot_dir: PathBuf::from("screenshots"),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(AutomationError::Configuration(
                "base_url must not be empty".to_string(),
            ));
        }
        self.tuning.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tuning_is_valid() {
        assert!(SimulationTuning::default().validate().is_ok());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let tuning = SimulationTuning {
            min_action_delay: Duration::from_millis(500),
            max_action_delay: Duration::from_millis(100),
            ..SimulationTuning::default()
        };
        let err = tuning.validate().unwrap_err();
        assert!(matches!(err, AutomationError::Configuration(_)));
    }

    #[test]
    fn zero_minimum_is_rejected() {
        let tuning = SimulationTuning {
            min_typing_delay: Duration::ZERO,
            ..SimulationTuning::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn equal_bounds_are_rejected() {
        let tuning = SimulationTuning {
            min_typing_delay: Duration::from_millis(100),
            max_typing_delay: Duration::from_millis(100),
            ..SimulationTuning::default()
        };
        assert!(tuning.validate().is_err());
    }
}
