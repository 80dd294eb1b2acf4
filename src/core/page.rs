use std::time::Duration;

use async_trait::async_trait;

use crate::errors::Result;

/// The live page/document collaborator. One implementation drives Chrome;
/// tests substitute a scripted double.
///
/// Implementations report failures as either transient (timeouts, network)
/// or engine errors; callers never depend on engine-internal retry behavior.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    async fn go_back(&self) -> Result<()>;

    /// Wait until no further network activity is pending after a navigation.
    async fn wait_for_quiescence(&self, timeout: Duration) -> Result<()>;

    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Number of elements the selector matches in the current document.
    async fn count_matches(&self, selector: &str) -> Result<usize>;

    async fn is_present(&self, selector: &str) -> Result<bool> {
        Ok(self.count_matches(selector).await? > 0)
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>>;

    async fn hover(&self, selector: &str) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()>;

    /// Emit one fragment of text into the element — a single keystroke's
    /// worth. Callers own the pacing between fragments.
    async fn type_fragment(&self, selector: &str, fragment: &str) -> Result<()>;

    /// Move the virtual pointer to viewport coordinates.
    async fn move_mouse(&self, x: f64, y: f64) -> Result<()>;

    async fn scroll_to_bottom(&self) -> Result<()>;

    async fn scroll_to_top(&self) -> Result<()>;

    async fn screenshot(&self) -> Result<Vec<u8>>;
}
