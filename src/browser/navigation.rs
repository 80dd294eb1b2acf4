use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

use super::chrome::ChromePage;
use crate::errors::{AutomationError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Installs fetch/XHR counters on first use and reports document readiness
/// together with the number of in-flight requests.
const QUIESCENCE_SCRIPT: &str = r#"
(function() {
    if (window.__hfNetWatch === undefined) {
        window.__hfNetWatch = { inflight: 0 };
        const watch = window.__hfNetWatch;

        const originalFetch = window.fetch;
        window.fetch = function(...args) {
            watch.inflight++;
            return originalFetch.apply(this, args).finally(() => { watch.inflight--; });
        };

        const originalOpen = XMLHttpRequest.prototype.open;
        XMLHttpRequest.prototype.open = function(...args) {
            watch.inflight++;
            this.addEventListener('loadend', () => { watch.inflight--; });
            return originalOpen.apply(this, args);
        };
    }

    return {
        ready: document.readyState === 'complete',
        inflight: window.__hfNetWatch.inflight
    };
})()
"#;

/// Polls until the document is loaded and no network activity is pending.
/// Expiry converts to a transient timeout error.
pub(crate) async fn await_quiescence(page: &ChromePage, timeout: Duration) -> Result<()> {
    let started = Instant::now();

    while started.elapsed() < timeout {
        match page.eval(QUIESCENCE_SCRIPT) {
            Ok(state) => {
                let ready = state.get("ready").and_then(Value::as_bool).unwrap_or(false);
                let inflight = state
                    .get("inflight")
                    .and_then(Value::as_u64)
                    .unwrap_or(u64::MAX);
                if ready && inflight == 0 {
                    debug!("Page quiescent after {:?}", started.elapsed());
                    tokio::time::sleep(SETTLE_DELAY).await;
                    return Ok(());
                }
            }
            Err(_) => {
                // The page may be mid-transition; keep polling.
            }
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }

    Err(AutomationError::Timeout(format!(
        "no network quiescence within {:?}",
        timeout
    )))
}

/// Polls until the selector matches something visible in the viewport's
/// layout. Expiry converts to a transient timeout error.
pub(crate) async fn await_visible(
    page: &ChromePage,
    selector: &str,
    timeout: Duration,
) -> Result<()> {
    let script = format!(
        r#"
        (function() {{
            const el = document.querySelector('{}');
            if (!el) return {{ visible: false }};
            const rect = el.getBoundingClientRect();
            const style = window.getComputedStyle(el);
            return {{
                visible: rect.width > 0 && rect.height > 0 &&
                         style.visibility !== 'hidden' && style.display !== 'none'
            }};
        }})()
        "#,
        ChromePage::escape(selector)
    );

    let started = Instant::now();

    while started.elapsed() < timeout {
        if let Ok(state) = page.eval(&script) {
            if state
                .get("visible")
                .and_then(Value::as_bool)
                .unwrap_or(false)
            {
                debug!("'{}' visible after {:?}", selector, started.elapsed());
                return Ok(());
            }
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }

    Err(AutomationError::Timeout(format!(
        "'{}' did not become visible within {:?}",
        selector, timeout
    )))
}
