use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::automation::base::SiteAutomation;
use crate::automation::selectors::SelectorSet;
use crate::automation::summary::{PhaseOutcome, RunSummary};
use crate::behavior::BehaviorSimulator;
use crate::core::config::RunConfig;
use crate::core::page::PageDriver;
use crate::errors::{AutomationError, Result};
use crate::types::Credentials;
use crate::utils::ScreenshotSink;

/// Where the pointer drifts to before the submit click, the way a hand
/// overshoots a button.
const DECOY_POINTER: (f64, f64) = (500.0, 600.0);
/// Bound on post-navigation network-quiescence waits.
const QUIESCENCE_TIMEOUT: Duration = Duration::from_secs(15);
/// Bound on waits for a specific container to render.
const CONTAINER_TIMEOUT: Duration = Duration::from_secs(10);
/// Ceiling on the randomly chosen number of product interactions.
const MAX_RANDOM_INTERACTIONS: usize = 3;
/// Path of the inventory view relative to the origin.
const INVENTORY_PATH: &str = "/inventory.html";

/// Drives the storefront through sign-in, product browsing, cart
/// manipulation, and sign-out at a human pace.
pub struct StorefrontAutomation<P: PageDriver> {
    page: P,
    behavior: BehaviorSimulator,
    selectors: SelectorSet,
    screenshots: ScreenshotSink,
    summary: RunSummary,
    base_url: String,
    credentials: Option<Credentials>,
    requested_products: Option<usize>,
}

impl<P: PageDriver> StorefrontAutomation<P> {
    pub fn new(page: P, config: &RunConfig) -> Self {
        Self {
            page,
            behavior: BehaviorSimulator::new(config.tuning.clone()),
            selectors: SelectorSet::default(),
            screenshots: ScreenshotSink::new(config.screenshot_dir.clone()),
            summary: RunSummary::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials.clone(),
            requested_products: config.num_products,
        }
    }

    /// Replace the behavior simulator, e.g. to inject a deterministic
    /// sampler.
    pub fn with_behavior(mut self, behavior: BehaviorSimulator) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_selectors(mut self, selectors: SelectorSet) -> Self {
        self.selectors = selectors;
        self
    }

    fn inventory_url(&self) -> String {
        format!("{}{}", self.base_url, INVENTORY_PATH)
    }

    async fn log_location(&self, phase: &str) {
        let url = self
            .page
            .current_url()
            .await
            .unwrap_or_else(|_| "<unknown>".to_string());
        info!("[{}] at {}", phase, url);
    }

    /// Best-effort checkpoint; a failed capture must never abort a phase.
    async fn checkpoint(&self, step: &str) {
        match self.page.screenshot().await {
            Ok(bytes) => {
                if let Err(err) = self.screenshots.save(&bytes, step).await {
                    warn!("Failed to persist screenshot '{}': {}", step, err);
                }
            }
            Err(err) => warn!("Failed to capture screenshot '{}': {}", step, err),
        }
    }

    /// Detects an involuntary logout and recovers inline. Returns whether a
    /// re-login was performed. A no-op when the login form is absent.
    pub async fn check_and_relogin(&mut self) -> Result<bool> {
        if !self.page.is_present(&self.selectors.username_field).await? {
            return Ok(false);
        }

        warn!("Login form detected mid-run; the session was logged out, re-authenticating");
        self.checkpoint("relogin_attempt").await;
        self.do_login().await?;
        self.page.navigate(&self.inventory_url()).await?;
        self.page
            .wait_for_visible(&self.selectors.inventory_container, CONTAINER_TIMEOUT)
            .await?;
        Ok(true)
    }

    async fn do_setup(&mut self) -> Result<()> {
        info!("Navigating to {}", self.base_url);
        self.page.navigate(&self.base_url).await?;
        self.page.wait_for_quiescence(QUIESCENCE_TIMEOUT).await?;
        self.log_location("setup").await;
        Ok(())
    }

    async fn do_login(&mut self) -> Result<()> {
        self.log_location("login").await;
        let credentials = self.credentials.clone().ok_or_else(|| {
            AutomationError::Configuration("credentials are required for login".to_string())
        })?;

        match self.submit_login_form(&credentials).await {
            Ok(()) => {
                self.summary.login = PhaseOutcome::Success;
                self.checkpoint("after_login").await;
                info!("Logged in as {}", credentials.username);
                Ok(())
            }
            Err(err) => {
                let kind = if err.is_network() {
                    "network failure"
                } else {
                    "failure"
                };
                self.summary.login = PhaseOutcome::Failed(format!("{}: {}", kind, err));
                error!("Login failed: {}", err);
                Err(err)
            }
        }
    }

    async fn submit_login_form(&mut self, credentials: &Credentials) -> Result<()> {
        let username_field = self
            .behavior
            .hover_and_resolve(&self.page, self.selectors.username_field.as_str())
            .await?;
        self.behavior
            .type_text(&self.page, &username_field, &credentials.username)
            .await?;

        let password_field = self
            .behavior
            .hover_and_resolve(&self.page, self.selectors.password_field.as_str())
            .await?;
        self.behavior
            .type_text(&self.page, &password_field, &credentials.password)
            .await?;

        self.behavior
            .move_to(&self.page, DECOY_POINTER.0, DECOY_POINTER.1)
            .await?;

        let submit = self
            .behavior
            .hover_and_resolve(&self.page, self.selectors.login_button.as_str())
            .await?;
        self.page.click(submit.selector()).await?;

        self.page.wait_for_quiescence(QUIESCENCE_TIMEOUT).await?;
        self.page
            .wait_for_visible(&self.selectors.inventory_container, CONTAINER_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn do_perform_actions(&mut self) -> Result<()> {
        self.check_and_relogin().await?;
        self.behavior.scroll(&self.page).await?;
        self.interact_with_products().await?;
        self.open_cart().await?;
        self.remove_cart_item().await?;
        self.log_out().await?;
        Ok(())
    }

    /// How many products this run interacts with. A caller-supplied count
    /// inside `[1, available]` passes through; anything else clamps to
    /// `min(3, available)`; unset draws uniformly from that range.
    fn interaction_count(&self, available: usize) -> usize {
        let cap = available.min(MAX_RANDOM_INTERACTIONS);
        match self.requested_products {
            Some(n) if (1..=available).contains(&n) => n,
            Some(n) => {
                warn!(
                    "Requested {} product interactions with {} available; clamping to {}",
                    n, available, cap
                );
                cap
            }
            None => self.behavior.sampler().count_between(1, cap),
        }
    }

    async fn interact_with_products(&mut self) -> Result<()> {
        self.log_location("products").await;
        self.page
            .wait_for_visible(&self.selectors.inventory_item, CONTAINER_TIMEOUT)
            .await?;

        let available = self
            .page
            .count_matches(&self.selectors.inventory_item)
            .await?;
        if available == 0 {
            warn!("No products found on the inventory view");
            self.summary.products = PhaseOutcome::Partial {
                completed: 0,
                attempted: 0,
            };
            return Ok(());
        }

        let attempts = self.interaction_count(available);
        info!("Interacting with {} of {} products", attempts, available);

        let mut completed = 0;
        for iteration in 1..=attempts {
            match self.interact_with_one_product().await {
                Ok(name) => {
                    completed += 1;
                    info!(
                        "Added product '{}' to cart ({}/{})",
                        name, iteration, attempts
                    );
                }
                Err(err) if err.is_network() => {
                    warn!(
                        "Product interaction {} hit a network failure: {}",
                        iteration, err
                    );
                    self.checkpoint(&format!("network_error_product_{}", iteration))
                        .await;
                }
                Err(err) => warn!("Product interaction {} failed: {}", iteration, err),
            }
        }

        self.summary.products = PhaseOutcome::Partial {
            completed,
            attempted: attempts,
        };
        Ok(())
    }

    async fn interact_with_one_product(&mut self) -> Result<String> {
        // A swallowed failure in a previous iteration may have stranded the
        // page elsewhere; re-verify before acting.
        self.ensure_inventory_view().await?;

        // The product list is invalidated by every navigation; re-read it.
        let available = self
            .page
            .count_matches(&self.selectors.inventory_item)
            .await?;
        if available == 0 {
            return Err(AutomationError::Engine(
                "inventory emptied mid-run".to_string(),
            ));
        }

        let index = self.behavior.sampler().index_below(available) + 1;
        let name = self
            .page
            .inner_text(&self.selectors.nth_item_name(index))
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| "unknown".to_string());

        let tile = self
            .behavior
            .hover_and_resolve(&self.page, self.selectors.nth_inventory_item(index))
            .await?;
        self.page.click(tile.selector()).await?;
        info!("Clicked product '{}'", name);
        self.page.wait_for_quiescence(QUIESCENCE_TIMEOUT).await?;
        self.behavior.pace().await;

        let add_button = self
            .behavior
            .hover_and_resolve(&self.page, self.selectors.add_to_cart_button.as_str())
            .await?;
        self.page.click(add_button.selector()).await?;

        self.page.go_back().await?;
        self.page
            .wait_for_visible(&self.selectors.inventory_container, CONTAINER_TIMEOUT)
            .await?;
        Ok(name)
    }

    async fn ensure_inventory_view(&mut self) -> Result<()> {
        if self
            .page
            .is_present(&self.selectors.inventory_container)
            .await?
        {
            return Ok(());
        }
        warn!("Not on the inventory view; navigating back to it");
        self.page.navigate(&self.inventory_url()).await?;
        self.page
            .wait_for_visible(&self.selectors.inventory_container, CONTAINER_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn open_cart(&mut self) -> Result<()> {
        self.check_and_relogin().await?;
        self.log_location("cart").await;

        if let Err(err) = self.visit_cart().await {
            if err.is_network() {
                self.summary.cart_removal =
                    PhaseOutcome::Failed(format!("network failure: {}", err));
            }
            return Err(err);
        }

        self.checkpoint("cart_view").await;
        Ok(())
    }

    async fn visit_cart(&mut self) -> Result<()> {
        let cart_link = self
            .behavior
            .hover_and_resolve(&self.page, self.selectors.cart_link.as_str())
            .await?;
        self.page.click(cart_link.selector()).await?;
        self.page.wait_for_quiescence(QUIESCENCE_TIMEOUT).await?;
        info!("Opened the cart view");
        Ok(())
    }

    async fn remove_cart_item(&mut self) -> Result<()> {
        self.log_location("cart_removal").await;

        let items = self.page.count_matches(&self.selectors.cart_item).await?;
        if items == 0 {
            info!("Cart is empty; nothing to remove");
            self.summary.cart_removal = PhaseOutcome::Skipped;
            return Ok(());
        }

        let index = self.behavior.sampler().index_below(items) + 1;
        let name = self
            .page
            .inner_text(&self.selectors.nth_cart_item_name(index))
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| "unknown".to_string());

        // The removal control must resolve strictly; per-item addressing
        // keeps this meaningful with several items in the cart.
        let remove_button = self
            .behavior
            .hover_and_resolve(&self.page, self.selectors.nth_cart_remove(index))
            .await?;
        self.page.click(remove_button.selector()).await?;

        info!("Removed '{}' from the cart", name);
        self.summary.cart_removal = PhaseOutcome::Success;
        Ok(())
    }

    async fn log_out(&mut self) -> Result<()> {
        self.check_and_relogin().await?;
        self.log_location("logout").await;

        let menu = self
            .behavior
            .hover_and_resolve(&self.page, self.selectors.menu_button.as_str())
            .await?;
        self.page.click(menu.selector()).await?;
        self.behavior.pace().await;

        let logout_link = self
            .behavior
            .hover_and_resolve(&self.page, self.selectors.logout_link.as_str())
            .await?;
        self.page.click(logout_link.selector()).await?;
        self.page.wait_for_quiescence(QUIESCENCE_TIMEOUT).await?;

        self.checkpoint("after_logout").await;
        self.summary.logout = PhaseOutcome::Success;
        info!("Logged out");
        Ok(())
    }
}

#[async_trait]
impl<P: PageDriver> SiteAutomation for StorefrontAutomation<P> {
    async fn setup(&mut self) -> Result<()> {
        self.do_setup().await
    }

    async fn login(&mut self) -> Result<()> {
        self.do_login().await
    }

    async fn perform_actions(&mut self) -> Result<()> {
        self.do_perform_actions().await
    }

    async fn screenshot(&mut self, step: &str) -> Result<()> {
        let bytes = self.page.screenshot().await?;
        self.screenshots.save(&bytes, step).await?;
        Ok(())
    }

    fn summary(&self) -> RunSummary {
        self.summary.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHelper;

    #[tokio::test]
    async fn requested_count_in_range_passes_through() {
        let page = TestHelper::storefront_page(5, 0);
        let automation = TestHelper::automation(page, Some(2));
        assert_eq!(automation.interaction_count(5), 2);
    }

    #[tokio::test]
    async fn oversized_request_clamps_to_cap() {
        let page = TestHelper::storefront_page(5, 0);
        let automation = TestHelper::automation(page, Some(9));
        assert_eq!(automation.interaction_count(5), 3);
    }

    #[tokio::test]
    async fn zero_request_clamps_to_cap() {
        let page = TestHelper::storefront_page(5, 0);
        let automation = TestHelper::automation(page, Some(0));
        assert_eq!(automation.interaction_count(5), 3);
    }

    #[tokio::test]
    async fn unset_request_draws_from_sampler() {
        let page = TestHelper::storefront_page(5, 0);
        let automation = TestHelper::automation(page, None);
        // FixedSampler resolves count_between to its configured count.
        let count = automation.interaction_count(5);
        assert!((1..=3).contains(&count));
    }

    #[tokio::test]
    async fn cap_never_exceeds_available() {
        let page = TestHelper::storefront_page(2, 0);
        let automation = TestHelper::automation(page, Some(7));
        assert_eq!(automation.interaction_count(2), 2);
    }

    #[tokio::test]
    async fn relogin_guard_is_a_noop_when_form_absent() {
        let page = TestHelper::storefront_page(3, 0);
        // The storefront page starts logged in: no username field present.
        page.set_count("#user-name", 0);
        let mut automation = TestHelper::automation(page.clone(), None);

        assert!(!automation.check_and_relogin().await.unwrap());
        assert!(!automation.check_and_relogin().await.unwrap());
        assert_eq!(page.action_count("type #user-name"), 0);
    }

    #[tokio::test]
    async fn relogin_guard_recovers_once_per_logout() {
        let page = TestHelper::storefront_page(3, 0);
        TestHelper::script_login_form(&page);
        let mut automation = TestHelper::automation(page.clone(), None);

        assert!(automation.check_and_relogin().await.unwrap());
        // The scripted submit click hides the form again, so a second guard
        // invocation observes a live session.
        assert!(!automation.check_and_relogin().await.unwrap());
        assert_eq!(
            page.action_count("type #user-name"),
            "standard_user".len()
        );
        assert_eq!(automation.summary().login, PhaseOutcome::Success);
    }

    #[tokio::test]
    async fn network_failure_mid_loop_still_attempts_remaining_products() {
        let page = TestHelper::storefront_page(6, 0);
        // First add-to-cart succeeds, second fails at the network layer,
        // third succeeds again.
        page.push_click_result(".btn_inventory", None);
        page.push_click_result(
            ".btn_inventory",
            Some(AutomationError::Network("net::ERR_CONNECTION_RESET".into())),
        );
        page.push_click_result(".btn_inventory", None);
        let mut automation = TestHelper::automation(page.clone(), Some(3));

        automation.interact_with_products().await.unwrap();

        assert_eq!(
            automation.summary().products,
            PhaseOutcome::Partial {
                completed: 2,
                attempted: 3
            }
        );
        // All three iterations clicked a product tile.
        assert_eq!(page.action_count("click .inventory_item:nth-of-type"), 3);
    }

    #[tokio::test]
    async fn empty_cart_records_skipped() {
        let page = TestHelper::storefront_page(3, 0);
        let mut automation = TestHelper::automation(page, None);

        automation.remove_cart_item().await.unwrap();
        assert_eq!(automation.summary().cart_removal, PhaseOutcome::Skipped);
    }

    #[tokio::test]
    async fn cart_removal_clicks_the_items_remove_control() {
        let page = TestHelper::storefront_page(3, 2);
        let mut automation = TestHelper::automation(page.clone(), None);

        automation.remove_cart_item().await.unwrap();
        assert_eq!(automation.summary().cart_removal, PhaseOutcome::Success);
        assert_eq!(
            page.action_count("click .cart_item:nth-of-type(1) .btn_secondary"),
            1
        );
    }

    #[tokio::test]
    async fn login_without_credentials_is_a_configuration_error() {
        let page = TestHelper::storefront_page(3, 0);
        let config = RunConfig {
            credentials: None,
            ..TestHelper::run_config(None)
        };
        let mut automation =
            StorefrontAutomation::new(page, &config).with_behavior(TestHelper::behavior());

        let err = automation.login().await.unwrap_err();
        assert!(matches!(err, AutomationError::Configuration(_)));
        assert!(!err.is_retryable());
    }
}
