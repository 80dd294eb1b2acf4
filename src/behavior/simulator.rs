use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, info};

use crate::behavior::sampler::{Sampler, ThreadRngSampler};
use crate::core::config::SimulationTuning;
use crate::core::page::PageDriver;
use crate::errors::{AutomationError, Result};
use crate::types::{Locator, Target};

/// How long hover-resolution waits for a selector to become visible.
const VISIBILITY_TIMEOUT: Duration = Duration::from_secs(10);
/// Interpolation steps for one pointer move.
const POINTER_STEPS: u32 = 10;

/// Wraps primitive page actions with human-plausible timing and motion.
///
/// Holds the only pointer-position state in the system; a single run owns
/// one simulator, so the mutex is never contended.
pub struct BehaviorSimulator {
    tuning: SimulationTuning,
    sampler: Box<dyn Sampler>,
    pointer: Mutex<(f64, f64)>,
}

impl BehaviorSimulator {
    pub fn new(tuning: SimulationTuning) -> Self {
        Self::with_sampler(tuning, Box::new(ThreadRngSampler))
    }

    pub fn with_sampler(tuning: SimulationTuning, sampler: Box<dyn Sampler>) -> Self {
        Self {
            tuning,
            sampler,
            pointer: Mutex::new((0.0, 0.0)),
        }
    }

    pub fn sampler(&self) -> &dyn Sampler {
        self.sampler.as_ref()
    }

    /// Suspend for a human-plausible pause between actions.
    pub async fn pace(&self) {
        let delay = self
            .sampler
            .duration_between(self.tuning.min_action_delay, self.tuning.max_action_delay);
        debug!("Pacing for {:?}", delay);
        tokio::time::sleep(delay).await;
    }

    async fn typing_pause(&self) {
        let delay = self
            .sampler
            .duration_between(self.tuning.min_typing_delay, self.tuning.max_typing_delay);
        tokio::time::sleep(delay).await;
    }

    /// Type `text` one character at a time, pausing between keystrokes.
    /// Character order is preserved; nothing is batched.
    pub async fn type_text<P: PageDriver>(
        &self,
        page: &P,
        locator: &Locator,
        text: &str,
    ) -> Result<()> {
        info!(
            "Typing {} characters into {}",
            text.chars().count(),
            locator.selector()
        );
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            page.type_fragment(locator.selector(), ch.encode_utf8(&mut buf))
                .await?;
            self.typing_pause().await;
        }
        Ok(())
    }

    /// Move the virtual pointer along an interpolated path, then pause.
    pub async fn move_to<P: PageDriver>(&self, page: &P, x: f64, y: f64) -> Result<()> {
        let (sx, sy) = *self.pointer.lock().unwrap();
        info!(
            "Moving pointer from ({:.0}, {:.0}) to ({:.0}, {:.0})",
            sx, sy, x, y
        );
        for step in 1..=POINTER_STEPS {
            let t = f64::from(step) / f64::from(POINTER_STEPS);
            page.move_mouse(sx + (x - sx) * t, sy + (y - sy) * t).await?;
        }
        *self.pointer.lock().unwrap() = (x, y);
        self.pace().await;
        Ok(())
    }

    /// Scroll to the end of the document, pause, scroll back to the origin.
    pub async fn scroll<P: PageDriver>(&self, page: &P) -> Result<()> {
        info!("Scrolling through the page");
        page.scroll_to_bottom().await?;
        self.pace().await;
        page.scroll_to_top().await?;
        Ok(())
    }

    /// Resolve `target` to exactly one visible element, hover it, pause, and
    /// return the handle.
    ///
    /// This is the single chokepoint every click and keystroke passes
    /// through first. A match count other than one is a correctness fault in
    /// the selector, not a flake, and is never retried.
    pub async fn hover_and_resolve<P: PageDriver>(
        &self,
        page: &P,
        target: impl Into<Target>,
    ) -> Result<Locator> {
        let target = target.into();
        let selector = target.selector().to_string();
        page.wait_for_visible(&selector, VISIBILITY_TIMEOUT).await?;
        let count = page.count_matches(&selector).await?;
        if count != 1 {
            return Err(AutomationError::StrictResolution { selector, count });
        }
        debug!("Resolved '{}' to a single element, hovering", selector);
        page.hover(&selector).await?;
        self.pace().await;
        Ok(Locator::new(selector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedSampler, MockPage};

    fn simulator() -> BehaviorSimulator {
        BehaviorSimulator::with_sampler(
            SimulationTuning::default(),
            Box::new(FixedSampler::new(1)),
        )
    }

    #[tokio::test]
    async fn hover_resolves_a_single_match() {
        let page = MockPage::new();
        page.set_count("#login-button", 1);
        let locator = simulator()
            .hover_and_resolve(&page, "#login-button")
            .await
            .unwrap();
        assert_eq!(locator.selector(), "#login-button");
        assert_eq!(page.action_count("hover #login-button"), 1);
    }

    #[tokio::test]
    async fn hover_rejects_zero_matches() {
        let page = MockPage::new();
        let err = simulator()
            .hover_and_resolve(&page, "#missing")
            .await
            .unwrap_err();
        // An absent element never becomes visible, so the bounded wait
        // converts to a transient timeout before counting happens.
        assert!(matches!(err, AutomationError::Timeout(_)));
    }

    #[tokio::test]
    async fn hover_rejects_ambiguous_matches() {
        let page = MockPage::new();
        page.set_count(".inventory_item", 2);
        let err = simulator()
            .hover_and_resolve(&page, ".inventory_item")
            .await
            .unwrap_err();
        match err {
            AutomationError::StrictResolution { selector, count } => {
                assert_eq!(selector, ".inventory_item");
                assert_eq!(count, 2);
            }
            other => panic!("expected StrictResolution, got {:?}", other),
        }
        // Strict-resolution faults must not be treated as retryable.
        assert!(!AutomationError::StrictResolution {
            selector: String::new(),
            count: 2
        }
        .is_retryable());
    }

    #[tokio::test]
    async fn typing_emits_characters_in_order() {
        let page = MockPage::new();
        page.set_count("#user-name", 1);
        let locator = Locator::new("#user-name");
        simulator()
            .type_text(&page, &locator, "abc")
            .await
            .unwrap();
        let typed: Vec<String> = page
            .actions()
            .into_iter()
            .filter(|a| a.starts_with("type #user-name"))
            .collect();
        assert_eq!(
            typed,
            vec![
                "type #user-name a".to_string(),
                "type #user-name b".to_string(),
                "type #user-name c".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn pointer_moves_are_interpolated() {
        let page = MockPage::new();
        simulator().move_to(&page, 500.0, 600.0).await.unwrap();
        assert_eq!(page.action_count("move"), POINTER_STEPS as usize);
        // Last step lands exactly on the requested coordinates.
        assert_eq!(page.actions().last().unwrap(), "move 500,600");
    }
}
