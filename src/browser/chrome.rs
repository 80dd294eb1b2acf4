use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;

use super::navigation::{await_quiescence, await_visible};
use crate::core::config::SessionConfig;
use crate::core::engine::EngineTrait;
use crate::core::page::PageDriver;
use crate::errors::{AutomationError, Result};

/// Chrome engine implementation
pub struct ChromeEngine {
    browser: Option<Browser>,
}

impl ChromeEngine {
    pub fn new() -> Self {
        Self { browser: None }
    }
}

impl Default for ChromeEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EngineTrait for ChromeEngine {
    type Page = ChromePage;

    async fn launch(&mut self, config: &SessionConfig) -> Result<()> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        );

        let proxy_arg = config
            .proxy
            .as_ref()
            .map(|p| format!("--proxy-server={}", p.server));

        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];

        if let Some(ref proxy) = proxy_arg {
            args.push(OsStr::new(proxy));
        }

        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .args(args)
            .build()
            .map_err(|e| AutomationError::Engine(format!("browser launch failed: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| AutomationError::Engine(format!("browser launch failed: {}", e)))?;

        self.browser = Some(browser);
        Ok(())
    }

    async fn new_page(&self) -> Result<ChromePage> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| AutomationError::Engine("browser not launched".to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| AutomationError::Engine(format!("tab creation failed: {}", e)))?;

        Ok(ChromePage::new(tab))
    }

    fn is_running(&self) -> bool {
        self.browser.is_some()
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the handle tears down the Chrome process.
        self.browser = None;
        Ok(())
    }
}

/// One live Chrome tab driven through evaluated scripts and CDP calls.
pub struct ChromePage {
    tab: Arc<Tab>,
}

impl ChromePage {
    pub(crate) fn new(tab: Arc<Tab>) -> Self {
        Self { tab }
    }

    pub(crate) fn eval(&self, script: &str) -> Result<Value> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| AutomationError::from_engine_message(e.to_string()))?;
        Ok(result.value.unwrap_or(Value::Null))
    }

    pub(crate) fn escape(selector: &str) -> String {
        selector.replace('\\', "\\\\").replace('\'', "\\'")
    }

    fn check_outcome(result: Value, what: &str, selector: &str) -> Result<()> {
        if result
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            Ok(())
        } else {
            let msg = result
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            Err(AutomationError::from_engine_message(format!(
                "{} on '{}' failed: {}",
                what, selector, msg
            )))
        }
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| AutomationError::Navigation(e.to_string()))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| AutomationError::Navigation(e.to_string()))?;

        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.tab.get_url())
    }

    async fn go_back(&self) -> Result<()> {
        self.eval("history.back()")?;
        Ok(())
    }

    async fn wait_for_quiescence(&self, timeout: Duration) -> Result<()> {
        await_quiescence(self, timeout).await
    }

    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> Result<()> {
        await_visible(self, selector, timeout).await
    }

    async fn count_matches(&self, selector: &str) -> Result<usize> {
        let script = format!(
            "document.querySelectorAll('{}').length",
            Self::escape(selector)
        );
        let value = self.eval(&script)?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>> {
        let script = format!(
            r#"
            (function() {{
                const el = document.querySelector('{}');
                return el ? el.innerText : null;
            }})()
            "#,
            Self::escape(selector)
        );
        let value = self.eval(&script)?;
        Ok(value.as_str().map(|s| s.trim().to_string()))
    }

    async fn hover(&self, selector: &str) -> Result<()> {
        let script = format!(
            r#"
            (function() {{
                const el = document.querySelector('{}');
                if (!el) return {{ success: false, error: 'element not found' }};

                try {{
                    el.scrollIntoView({{ behavior: 'smooth', block: 'center' }});
                    const rect = el.getBoundingClientRect();
                    const cx = rect.left + rect.width / 2;
                    const cy = rect.top + rect.height / 2;

                    ['mouseover', 'mouseenter', 'mousemove'].forEach(type => {{
                        el.dispatchEvent(new MouseEvent(type, {{
                            bubbles: true,
                            cancelable: true,
                            clientX: cx,
                            clientY: cy
                        }}));
                    }});

                    return {{ success: true }};
                }} catch (e) {{
                    return {{ success: false, error: e.message }};
                }}
            }})()
            "#,
            Self::escape(selector)
        );

        Self::check_outcome(self.eval(&script)?, "hover", selector)
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let script = format!(
            r#"
            (function() {{
                const el = document.querySelector('{}');
                if (!el) return {{ success: false, error: 'element not found' }};

                try {{
                    el.scrollIntoView({{ block: 'center' }});
                    const rect = el.getBoundingClientRect();
                    const cx = rect.left + rect.width / 2;
                    const cy = rect.top + rect.height / 2;

                    ['mousedown', 'mouseup', 'click'].forEach(type => {{
                        el.dispatchEvent(new MouseEvent(type, {{
                            bubbles: true,
                            cancelable: true,
                            clientX: cx,
                            clientY: cy
                        }}));
                    }});

                    el.focus();
                    el.click();

                    return {{ success: true }};
                }} catch (e) {{
                    return {{ success: false, error: e.message }};
                }}
            }})()
            "#,
            Self::escape(selector)
        );

        Self::check_outcome(self.eval(&script)?, "click", selector)
    }

    async fn type_fragment(&self, selector: &str, fragment: &str) -> Result<()> {
        let script = format!(
            r#"
            (function() {{
                const el = document.querySelector('{}');
                if (!el) return {{ success: false, error: 'element not found' }};

                try {{
                    el.focus();
                    el.value = (el.value || '') + '{}';

                    ['keydown', 'keyup', 'input'].forEach(type => {{
                        el.dispatchEvent(new Event(type, {{ bubbles: true, cancelable: true }}));
                    }});

                    return {{ success: true }};
                }} catch (e) {{
                    return {{ success: false, error: e.message }};
                }}
            }})()
            "#,
            Self::escape(selector),
            Self::escape(fragment)
        );

        Self::check_outcome(self.eval(&script)?, "typing", selector)
    }

    async fn move_mouse(&self, x: f64, y: f64) -> Result<()> {
        let script = format!(
            r#"
            (function() {{
                const target = document.elementFromPoint({x}, {y}) || document.documentElement;
                target.dispatchEvent(new MouseEvent('mousemove', {{
                    bubbles: true,
                    cancelable: true,
                    clientX: {x},
                    clientY: {y}
                }}));
                return {{ success: true }};
            }})()
            "#,
            x = x,
            y = y
        );

        Self::check_outcome(self.eval(&script)?, "pointer move", "document")
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.eval("window.scrollTo(0, document.body.scrollHeight)")?;
        Ok(())
    }

    async fn scroll_to_top(&self) -> Result<()> {
        self.eval("window.scrollTo(0, 0)")?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let screenshot = self
            .tab
            .capture_screenshot(
                headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption::Png,
                None,
                None,
                true,
            )
            .map_err(|e| AutomationError::Screenshot(e.to_string()))?;

        Ok(screenshot)
    }
}
