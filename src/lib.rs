pub mod automation;
pub mod behavior;
pub mod browser;
pub mod core;
pub mod errors;
pub mod retry;
pub mod testing;
pub mod types;
pub mod utils;

pub use automation::{
    run_session, PhaseOutcome, RunSummary, SelectorSet, SiteAutomation, StorefrontAutomation,
};
pub use behavior::{BehaviorSimulator, Sampler, ThreadRngSampler};
pub use browser::{ChromeEngine, ChromePage, SessionContext};
pub use crate::core::{EngineTrait, PageDriver, RunConfig, SessionConfig, SimulationTuning, Viewport};
pub use errors::{AutomationError, Result};
pub use retry::RetryPolicy;
pub use types::{Credentials, Locator, ProxyConfig, Target};
pub use utils::ScreenshotSink;
