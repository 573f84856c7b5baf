use anyhow::{anyhow, Context};
use async_trait::async_trait;
use headless_chrome::protocol::cdp::Emulation;
use headless_chrome::{Browser, LaunchOptions, Tab};
use rand::seq::SliceRandom;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{Page, SessionProvider};
use crate::config::BrowserConfig;
use crate::utils::error::AppError;

static LAUNCH_ARGS: [&str; 6] = [
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-extensions",
    "--disable-blink-features=AutomationControlled",
    "--disable-renderer-backgrounding",
];

/// Script returning the main document's response status, 0 when unknown.
const RESPONSE_STATUS_JS: &str =
    "(() => { const nav = performance.getEntriesByType('navigation')[0]; return nav && nav.responseStatus ? nav.responseStatus : 0; })()";

/// True once the navigated document has been parsed; sub-resources may still load.
const DOM_READY_JS: &str = "location.href !== 'about:blank' && document.readyState !== 'loading'";

const READY_POLL: Duration = Duration::from_millis(100);

/// Launches one Chrome process per session, configured for the Japanese market.
#[derive(Debug, Clone)]
pub struct ChromeSessionProvider {
    config: BrowserConfig,
}

impl ChromeSessionProvider {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    fn pick_user_agent(&self) -> Option<String> {
        self.config.user_agents.choose(&mut rand::thread_rng()).cloned()
    }

    fn launch(config: &BrowserConfig) -> anyhow::Result<Browser> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false)
            .window_size(Some((config.viewport_width, config.viewport_height)))
            .args(LAUNCH_ARGS.iter().map(|arg| OsStr::new(*arg)).collect())
            .build()
            .map_err(|e| anyhow!("Failed to create launch options: {}", e))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(PathBuf::from(chrome_path));
        }

        Browser::new(launch_options).map_err(|e| anyhow!("Failed to launch browser: {}", e))
    }
}

#[async_trait]
impl SessionProvider for ChromeSessionProvider {
    async fn open(&self) -> crate::Result<Box<dyn Page>> {
        let profile = TabProfile {
            user_agent: self.pick_user_agent(),
            accept_language: self.config.accept_language.clone(),
            timezone: self.config.timezone.clone(),
            locale: self.config.locale.clone(),
        };
        debug!(user_agent = profile.user_agent.as_deref().unwrap_or("default"), "Opening browser session");

        let config = self.config.clone();
        let session = tokio::task::spawn_blocking(move || -> anyhow::Result<ChromeSession> {
            let browser = Self::launch(&config)?;
            // Fail at open time rather than on the first navigation
            let tab = profile.open_tab(&browser)?;
            Ok(ChromeSession {
                browser: Some(browser),
                tab: Arc::new(Mutex::new(Some(tab))),
                profile,
            })
        })
        .await
        .map_err(|e| AppError::BrowserLaunch(format!("launch task failed: {}", e)))?
        .map_err(|e| AppError::BrowserLaunch(e.to_string()))?;

        Ok(Box::new(session))
    }
}

/// Per-tab disguise, applied again to every tab the session opens.
#[derive(Debug, Clone)]
struct TabProfile {
    user_agent: Option<String>,
    accept_language: String,
    timezone: String,
    locale: String,
}

impl TabProfile {
    fn open_tab(&self, browser: &Browser) -> anyhow::Result<Arc<Tab>> {
        let tab = browser
            .new_tab()
            .map_err(|e| anyhow!("Failed to create tab: {}", e))?;

        tab.enable_stealth_mode()
            .map_err(|e| anyhow!("Failed to enable stealth mode: {}", e))?;

        if let Some(user_agent) = &self.user_agent {
            tab.set_user_agent(user_agent, Some(&self.accept_language), None)
                .map_err(|e| anyhow!("Failed to set user agent: {}", e))?;
        }

        tab.call_method(Emulation::SetTimezoneOverride {
            timezone_id: self.timezone.clone(),
        })
        .map_err(|e| anyhow!("Failed to override timezone: {}", e))?;

        tab.call_method(Emulation::SetLocaleOverride {
            locale: Some(self.locale.clone()),
        })
        .map_err(|e| anyhow!("Failed to override locale: {}", e))?;

        Ok(tab)
    }
}

/// A browser process and its current tab. Each navigation gets a fresh tab,
/// so an attempt abandoned on timeout never shares a tab with the retry.
pub struct ChromeSession {
    browser: Option<Browser>,
    tab: Arc<Mutex<Option<Arc<Tab>>>>,
    profile: TabProfile,
}

impl ChromeSession {
    fn current_tab(&self) -> anyhow::Result<Arc<Tab>> {
        self.tab
            .lock()
            .map_err(|_| anyhow!("tab lock poisoned"))?
            .clone()
            .ok_or_else(|| anyhow!("No page has been loaded"))
    }
}

/// Opens a new tab for the next attempt and closes the previous one.
fn replace_tab(browser: &Browser, profile: &TabProfile, slot: &Mutex<Option<Arc<Tab>>>) -> anyhow::Result<Arc<Tab>> {
    let tab = profile.open_tab(browser)?;

    let previous = slot
        .lock()
        .map_err(|_| anyhow!("tab lock poisoned"))?
        .replace(tab.clone());
    if let Some(previous) = previous {
        if let Err(e) = previous.close(false) {
            debug!("Failed to close previous tab: {}", e);
        }
    }
    Ok(tab)
}

/// Blocks until the DOM is parsed or `timeout` has passed.
fn wait_for_dom_ready(tab: &Tab, timeout: Duration) -> anyhow::Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        let ready = tab
            .evaluate(DOM_READY_JS, false)
            .map(|result| dom_ready(result.value.as_ref()))
            .unwrap_or(false);
        if ready {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(anyhow!("DOM not ready after {:?}", timeout));
        }
        std::thread::sleep(READY_POLL);
    }
}

fn dom_ready(value: Option<&serde_json::Value>) -> bool {
    matches!(value, Some(serde_json::Value::Bool(true)))
}

#[async_trait]
impl Page for ChromeSession {
    async fn goto(&self, url: &str, timeout: Duration) -> anyhow::Result<Option<u16>> {
        let browser = self
            .browser
            .clone()
            .ok_or_else(|| anyhow!("Browser already closed"))?;
        let profile = self.profile.clone();
        let slot = self.tab.clone();
        let target = url.to_string();

        let navigation = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<u16>> {
            let tab = replace_tab(&browser, &profile, &slot)?;
            tab.set_default_timeout(timeout);
            tab.navigate_to(&target)
                .map_err(|e| anyhow!("Navigation failed: {}", e))?;
            wait_for_dom_ready(&tab, timeout)?;

            let status = tab
                .evaluate(RESPONSE_STATUS_JS, false)
                .map_err(|e| anyhow!("Failed to read response status: {}", e))?
                .value
                .and_then(|v| v.as_u64())
                .and_then(|code| u16::try_from(code).ok())
                .filter(|code| *code != 0);
            Ok(status)
        });

        tokio::time::timeout(timeout, navigation)
            .await
            .map_err(|_| anyhow!("Navigation to {} timed out after {:?}", url, timeout))?
            .context("navigation task panicked")?
    }

    async fn html(&self) -> anyhow::Result<String> {
        let tab = self.current_tab()?;
        tokio::task::spawn_blocking(move || {
            tab.get_content()
                .map_err(|e| anyhow!("Failed to get page content: {}", e))
        })
        .await
        .context("content task panicked")?
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        let tab = self.tab.lock().ok().and_then(|mut slot| slot.take());
        let browser = self.browser.take();

        // Closing the tab and reaping Chrome block, keep that off async workers
        let teardown = move || {
            if let Some(tab) = tab {
                if let Err(e) = tab.close(true) {
                    warn!("Failed to close tab: {}", e);
                }
            }
            drop(browser);
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(teardown);
            }
            Err(_) => teardown(),
        }
    }
}
