//! Scripted doubles for the page and engine collaborators, plus helpers for
//! composing a storefront-shaped page in tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::automation::{SelectorSet, StorefrontAutomation};
use crate::behavior::{BehaviorSimulator, Sampler};
use crate::core::config::{RunConfig, SessionConfig, SimulationTuning};
use crate::core::engine::EngineTrait;
use crate::core::page::PageDriver;
use crate::errors::{AutomationError, Result};
use crate::types::Credentials;

/// Scripted page double. Selector match counts and texts are configured up
/// front, every interaction is recorded, click failures can be queued per
/// selector, and a click can rewrite match counts to model a page
/// transition.
#[derive(Clone, Default)]
pub struct MockPage {
    inner: Arc<Mutex<MockPageState>>,
}

#[derive(Default)]
struct MockPageState {
    url: String,
    counts: HashMap<String, usize>,
    texts: HashMap<String, String>,
    click_results: HashMap<String, VecDeque<Option<AutomationError>>>,
    on_click_counts: HashMap<String, Vec<(String, usize)>>,
    actions: Vec<String>,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_count(&self, selector: &str, count: usize) {
        self.inner
            .lock()
            .unwrap()
            .counts
            .insert(selector.to_string(), count);
    }

    pub fn set_text(&self, selector: &str, text: &str) {
        self.inner
            .lock()
            .unwrap()
            .texts
            .insert(selector.to_string(), text.to_string());
    }

    /// Queue the outcome of the next click on `selector`: `None` succeeds,
    /// `Some(err)` fails. An empty queue always succeeds.
    pub fn push_click_result(&self, selector: &str, result: Option<AutomationError>) {
        self.inner
            .lock()
            .unwrap()
            .click_results
            .entry(selector.to_string())
            .or_default()
            .push_back(result);
    }

    /// Clicking `clicked` rewrites the given selector counts, modeling the
    /// page transition that click causes.
    pub fn on_click_set_counts(&self, clicked: &str, updates: Vec<(&str, usize)>) {
        self.inner.lock().unwrap().on_click_counts.insert(
            clicked.to_string(),
            updates
                .into_iter()
                .map(|(s, c)| (s.to_string(), c))
                .collect(),
        );
    }

    pub fn actions(&self) -> Vec<String> {
        self.inner.lock().unwrap().actions.clone()
    }

    pub fn action_count(&self, prefix: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .actions
            .iter()
            .filter(|a| a.starts_with(prefix))
            .count()
    }

    fn record(&self, entry: String) {
        self.inner.lock().unwrap().actions.push(entry);
    }

    fn count_of(&self, selector: &str) -> usize {
        *self
            .inner
            .lock()
            .unwrap()
            .counts
            .get(selector)
            .unwrap_or(&0)
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.record(format!("navigate {}", url));
        self.inner.lock().unwrap().url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.inner.lock().unwrap().url.clone())
    }

    async fn go_back(&self) -> Result<()> {
        self.record("back".to_string());
        Ok(())
    }

    async fn wait_for_quiescence(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn wait_for_visible(&self, selector: &str, _timeout: Duration) -> Result<()> {
        if self.count_of(selector) == 0 {
            return Err(AutomationError::Timeout(format!(
                "'{}' did not become visible",
                selector
            )));
        }
        Ok(())
    }

    async fn count_matches(&self, selector: &str) -> Result<usize> {
        Ok(self.count_of(selector))
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>> {
        Ok(self.inner.lock().unwrap().texts.get(selector).cloned())
    }

    async fn hover(&self, selector: &str) -> Result<()> {
        self.record(format!("hover {}", selector));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let queued = self
            .inner
            .lock()
            .unwrap()
            .click_results
            .get_mut(selector)
            .and_then(|q| q.pop_front())
            .flatten();
        if let Some(err) = queued {
            return Err(err);
        }

        let updates = self
            .inner
            .lock()
            .unwrap()
            .on_click_counts
            .get(selector)
            .cloned();
        if let Some(updates) = updates {
            let mut state = self.inner.lock().unwrap();
            for (sel, count) in updates {
                state.counts.insert(sel, count);
            }
        }

        self.record(format!("click {}", selector));
        Ok(())
    }

    async fn type_fragment(&self, selector: &str, fragment: &str) -> Result<()> {
        self.record(format!("type {} {}", selector, fragment));
        Ok(())
    }

    async fn move_mouse(&self, x: f64, y: f64) -> Result<()> {
        self.record(format!("move {:.0},{:.0}", x, y));
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.record("scroll bottom".to_string());
        Ok(())
    }

    async fn scroll_to_top(&self) -> Result<()> {
        self.record("scroll top".to_string());
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.record("screenshot".to_string());
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}

/// Engine double that hands out clones of one scripted page and counts how
/// often it is closed.
pub struct MockEngine {
    page: MockPage,
    launched: bool,
    close_count: Arc<AtomicUsize>,
}

impl MockEngine {
    pub fn new(page: MockPage) -> Self {
        Self {
            page,
            launched: false,
            close_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn close_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.close_count)
    }
}

#[async_trait]
impl EngineTrait for MockEngine {
    type Page = MockPage;

    async fn launch(&mut self, _config: &SessionConfig) -> Result<()> {
        self.launched = true;
        Ok(())
    }

    async fn new_page(&self) -> Result<MockPage> {
        Ok(self.page.clone())
    }

    fn is_running(&self) -> bool {
        self.launched
    }

    async fn close(&mut self) -> Result<()> {
        self.launched = false;
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Deterministic sampler: no delays, a fixed interaction count, and scripted
/// index choices (falling back to the first element).
pub struct FixedSampler {
    count: usize,
    indices: Mutex<VecDeque<usize>>,
}

impl FixedSampler {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            indices: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_indices(count: usize, indices: Vec<usize>) -> Self {
        Self {
            count,
            indices: Mutex::new(indices.into()),
        }
    }
}

impl Sampler for FixedSampler {
    fn duration_between(&self, _min: Duration, _max: Duration) -> Duration {
        Duration::ZERO
    }

    fn index_below(&self, n: usize) -> usize {
        let scripted = self.indices.lock().unwrap().pop_front().unwrap_or(0);
        if n == 0 {
            0
        } else {
            scripted.min(n - 1)
        }
    }

    fn count_between(&self, lo: usize, hi: usize) -> usize {
        self.count.clamp(lo, hi)
    }
}

pub struct TestHelper;

impl TestHelper {
    /// A logged-in storefront page: visible inventory with `products` tiles,
    /// a cart with `cart_items` entries, and working navigation chrome.
    pub fn storefront_page(products: usize, cart_items: usize) -> MockPage {
        let selectors = SelectorSet::default();
        let page = MockPage::new();

        page.set_count(&selectors.inventory_container, 1);
        page.set_count(&selectors.inventory_item, products);
        for i in 1..=products {
            page.set_count(&selectors.nth_inventory_item(i), 1);
            page.set_count(&selectors.nth_item_name(i), 1);
            page.set_text(&selectors.nth_item_name(i), &format!("Item {}", i));
        }
        page.set_count(&selectors.add_to_cart_button, 1);

        page.set_count(&selectors.cart_link, 1);
        page.set_count(&selectors.cart_item, cart_items);
        for i in 1..=cart_items {
            page.set_count(&selectors.nth_cart_item(i), 1);
            page.set_count(&selectors.nth_cart_remove(i), 1);
            page.set_count(&selectors.nth_cart_item_name(i), 1);
            page.set_text(&selectors.nth_cart_item_name(i), &format!("Item {}", i));
        }

        page.set_count(&selectors.menu_button, 1);
        page.set_count(&selectors.logout_link, 1);
        page
    }

    /// Make the login form visible and wire the submit click to hide it and
    /// reveal the inventory, the way a successful sign-in transitions.
    pub fn script_login_form(page: &MockPage) {
        let selectors = SelectorSet::default();
        page.set_count(&selectors.username_field, 1);
        page.set_count(&selectors.password_field, 1);
        page.set_count(&selectors.login_button, 1);
        page.on_click_set_counts(
            &selectors.login_button,
            vec![
                ("#user-name", 0),
                ("#password", 0),
                ("#login-button", 0),
                (".inventory_list", 1),
            ],
        );
    }

    pub fn run_config(num_products: Option<usize>) -> RunConfig {
        RunConfig {
            base_url: "https://store.test".to_string(),
            credentials: Some(Credentials::new("standard_user", "secret_sauce")),
            num_products,
            tuning: SimulationTuning::default(),
            screenshot_dir: std::env::temp_dir()
                .join(format!("humanflow-test-{}", uuid::Uuid::new_v4())),
        }
    }

    pub fn behavior() -> BehaviorSimulator {
        BehaviorSimulator::with_sampler(
            SimulationTuning::default(),
            Box::new(FixedSampler::new(2)),
        )
    }

    pub fn automation(
        page: MockPage,
        num_products: Option<usize>,
    ) -> StorefrontAutomation<MockPage> {
        StorefrontAutomation::new(page, &Self::run_config(num_products))
            .with_behavior(Self::behavior())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::{run_session, PhaseOutcome, StorefrontAutomation};
    use crate::browser::session::SessionContext;

    #[tokio::test]
    async fn full_run_completes_every_phase() {
        let page = TestHelper::storefront_page(6, 1);
        TestHelper::script_login_form(&page);
        page.set_count(".inventory_list", 0);
        let engine = MockEngine::new(page.clone());
        let closes = engine.close_count();

        let config = TestHelper::run_config(None);
        let summary = run_session(engine, &SessionConfig::default(), |p| {
            StorefrontAutomation::new(p, &config).with_behavior(TestHelper::behavior())
        })
        .await
        .unwrap();

        assert_eq!(summary.login, PhaseOutcome::Success);
        assert_eq!(
            summary.products,
            PhaseOutcome::Partial {
                completed: 2,
                attempted: 2
            }
        );
        assert_eq!(summary.cart_removal, PhaseOutcome::Success);
        assert_eq!(summary.logout, PhaseOutcome::Success);
        assert!(!summary.login.is_pending());

        // One cart visit, one removal, one logout.
        assert_eq!(page.action_count("click .shopping_cart_link"), 1);
        assert_eq!(page.action_count("click .cart_item:nth-of-type(1)"), 1);
        assert_eq!(page.action_count("click #logout_sidebar_link"), 1);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn session_releases_even_when_login_exhausts_retries() {
        let page = TestHelper::storefront_page(6, 0);
        // The form is present, but submitting never reveals the inventory,
        // so every login attempt times out.
        let selectors = SelectorSet::default();
        page.set_count(&selectors.username_field, 1);
        page.set_count(&selectors.password_field, 1);
        page.set_count(&selectors.login_button, 1);
        page.set_count(&selectors.inventory_container, 0);

        let engine = MockEngine::new(page.clone());
        let closes = engine.close_count();

        let config = TestHelper::run_config(None);
        let err = run_session(engine, &SessionConfig::default(), |p| {
            StorefrontAutomation::new(p, &config).with_behavior(TestHelper::behavior())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AutomationError::Timeout(_)));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        // Three whole login attempts, each typing the full username.
        assert_eq!(
            page.action_count("type #user-name"),
            "standard_user".len() * 3
        );
    }

    #[tokio::test]
    async fn session_context_acquires_and_releases_once() {
        let engine = MockEngine::new(MockPage::new());
        let closes = engine.close_count();

        let session = SessionContext::acquire(engine, &SessionConfig::default())
            .await
            .unwrap();
        assert!(session.is_active());
        session.release().await.unwrap();

        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn scripted_sampler_prefers_queued_indices() {
        let sampler = FixedSampler::with_indices(1, vec![4, 1]);
        assert_eq!(sampler.index_below(6), 4);
        assert_eq!(sampler.index_below(6), 1);
        // Exhausted queue falls back to the first element.
        assert_eq!(sampler.index_below(6), 0);
        // Indices clamp to the collection that is actually on the page.
        let clamped = FixedSampler::with_indices(1, vec![9]);
        assert_eq!(clamped.index_below(3), 2);
    }
}
