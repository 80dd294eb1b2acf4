use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseOutcome {
    Pending,
    Success,
    Skipped,
    Failed(String),
    /// Degraded or complete product work: how many interactions landed out
    /// of how many were attempted.
    Partial {
        completed: usize,
        attempted: usize,
    },
}

impl PhaseOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, PhaseOutcome::Pending)
    }
}

impl fmt::Display for PhaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseOutcome::Pending => write!(f, "pending"),
            PhaseOutcome::Success => write!(f, "success"),
            PhaseOutcome::Skipped => write!(f, "skipped"),
            PhaseOutcome::Failed(reason) => write!(f, "failed ({})", reason),
            PhaseOutcome::Partial {
                completed,
                attempted,
            } => write!(f, "{} of {}", completed, attempted),
        }
    }
}

/// Per-phase outcomes and timing for one run. Created when the automation is
/// constructed, mutated in place by each phase, finalized and emitted once
/// after the state machine halts — success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub login: PhaseOutcome,
    pub products: PhaseOutcome,
    pub cart_removal: PhaseOutcome,
    pub logout: PhaseOutcome,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            login: PhaseOutcome::Pending,
            products: PhaseOutcome::Pending,
            cart_removal: PhaseOutcome::Pending,
            logout: PhaseOutcome::Pending,
            elapsed: Duration::ZERO,
        }
    }

    pub fn finalize(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    pub fn report(&self) -> String {
        format!(
            "run {}: login {}, products {}, cart removal {}, logout {}, elapsed {:.2}s",
            self.run_id,
            self.login,
            self.products,
            self.cart_removal,
            self.logout,
            self.elapsed.as_secs_f64()
        )
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_outcome_renders_as_ratio() {
        let outcome = PhaseOutcome::Partial {
            completed: 2,
            attempted: 3,
        };
        assert_eq!(outcome.to_string(), "2 of 3");
    }

    #[test]
    fn report_includes_every_phase() {
        let mut summary = RunSummary::new();
        summary.login = PhaseOutcome::Success;
        summary.products = PhaseOutcome::Partial {
            completed: 3,
            attempted: 3,
        };
        summary.cart_removal = PhaseOutcome::Skipped;
        summary.logout = PhaseOutcome::Failed("network failure: timed out".to_string());
        summary.finalize(Duration::from_millis(2500));

        let report = summary.report();
        assert!(report.contains("login success"));
        assert!(report.contains("products 3 of 3"));
        assert!(report.contains("cart removal skipped"));
        assert!(report.contains("logout failed"));
        assert!(report.contains("2.50s"));
    }

    #[test]
    fn new_summary_is_all_pending() {
        let summary = RunSummary::new();
        assert!(summary.login.is_pending());
        assert!(summary.products.is_pending());
        assert!(summary.cart_removal.is_pending());
        assert!(summary.logout.is_pending());
    }
}
