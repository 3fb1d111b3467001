//! Headless Chrome driven over CDP.

use crate::config::ScrapeConfig;
use crate::extract::{ExtractedStory, StoryExtractor};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{EventLifecycleEvent, NavigateParams};
use chromiumoxide::Page;
use futures::StreamExt;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use swatch_common::{Result, SwatchError};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};
use url::Url;

const LAUNCH_ARGS: [&str; 3] = [
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
];

const RENDER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lifecycle events Chrome fires once at most two connections stay open.
const NETWORK_IDLE_EVENTS: [&str; 2] = ["networkAlmostIdle", "networkIdle"];

/// Whether a lifecycle event signals network quiescence for the navigation
/// that produced `expected_loader`. Same-document navigations carry no loader
/// id, in which case any idle event counts.
fn is_network_idle(name: &str, loader_id: &str, expected_loader: Option<&str>) -> bool {
    NETWORK_IDLE_EVENTS.contains(&name) && expected_loader.map_or(true, |id| id == loader_id)
}

const ROOT_READY_JS: &str = r#"(() => {
  const root = document.getElementById("storybook-root")
    || document.getElementById("root")
    || document.querySelector("[data-story]");
  return !!root && root.innerHTML.trim().length > 0;
})()"#;

const EXTRACT_JS: &str = r#"(() => {
  const root = document.getElementById("storybook-root")
    || document.getElementById("root")
    || document.body;
  const html = root.innerHTML;
  const styles = Array.from(document.querySelectorAll("style"))
    .map((s) => s.textContent || "")
    .join("\n");
  const computedTokens = {};
  const rootStyle = getComputedStyle(document.documentElement);
  for (const sheet of Array.from(document.styleSheets)) {
    let rules;
    try {
      rules = Array.from(sheet.cssRules);
    } catch (e) {
      continue;
    }
    for (const rule of rules) {
      if (!(rule instanceof CSSStyleRule)) continue;
      const style = rule.style;
      for (let i = 0; i < style.length; i++) {
        const prop = style[i];
        if (!prop.startsWith("--")) continue;
        const computed = rootStyle.getPropertyValue(prop).trim();
        computedTokens[prop] = computed || style.getPropertyValue(prop).trim();
      }
    }
  }
  return { html, styles, computedTokens };
})()"#;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoryPayload {
    html: String,
    styles: String,
    #[serde(default)]
    computed_tokens: IndexMap<String, String>,
}

/// `{base}/iframe.html?id={story}&viewMode=story`
pub fn story_url(base_url: &str, story_id: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(&format!("{}/iframe.html", base_url.trim_end_matches('/')))
        .with_context(|| format!("Invalid Storybook URL: {}", base_url))?;
    url.query_pairs_mut()
        .append_pair("id", story_id)
        .append_pair("viewMode", "story");
    Ok(url)
}

/// One headless browser shared by every story of a run; one page per story.
pub struct ChromeExtractor {
    browser: Browser,
    handler: JoinHandle<()>,
    story_timeout: Duration,
    settle_delay: Duration,
}

impl ChromeExtractor {
    pub async fn launch(executable: &Path, config: &ScrapeConfig) -> anyhow::Result<Self> {
        let browser_config = LAUNCH_ARGS
            .iter()
            .fold(
                BrowserConfig::builder()
                    .chrome_executable(executable)
                    .no_sandbox(),
                |builder, arg| builder.arg(*arg),
            )
            .build()
            .map_err(|e| anyhow!("Invalid browser configuration: {}", e))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .with_context(|| format!("Failed to launch browser at {}", executable.display()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler error: {}", e);
                }
            }
        });

        info!("Launched headless browser from {}", executable.display());

        Ok(Self {
            browser,
            handler,
            story_timeout: config.story_timeout,
            settle_delay: config.settle_delay,
        })
    }

    async fn wait_for_render(&self, page: &Page) {
        let deadline = Instant::now() + self.story_timeout;
        loop {
            let ready = match page.evaluate_expression(ROOT_READY_JS).await {
                Ok(result) => result.into_value::<bool>().unwrap_or(false),
                Err(_) => false,
            };
            if ready {
                return;
            }
            if Instant::now() >= deadline {
                // some stories render outside the root container
                debug!("Render wait timed out, extracting anyway");
                return;
            }
            sleep(RENDER_POLL_INTERVAL).await;
        }
    }

    /// Navigate and wait until the network has gone quiet.
    async fn navigate(&self, page: &Page, url: &Url) -> anyhow::Result<()> {
        let mut lifecycle = page
            .event_listener::<EventLifecycleEvent>()
            .await
            .context("Failed to subscribe to lifecycle events")?;

        let navigated = page
            .execute(NavigateParams::new(url.as_str()))
            .await
            .context("Navigation failed")?;
        if let Some(error) = navigated.result.error_text.as_deref() {
            return Err(anyhow!("Navigation failed: {}", error));
        }
        let expected_loader = navigated.result.loader_id.as_ref().map(|l| l.inner().as_str());

        while let Some(event) = lifecycle.next().await {
            if is_network_idle(&event.name, event.loader_id.inner(), expected_loader) {
                return Ok(());
            }
        }
        debug!("Lifecycle stream ended before network idle");
        Ok(())
    }

    async fn extract_on_page(&self, page: &Page, url: &Url) -> anyhow::Result<StoryPayload> {
        match timeout(self.story_timeout, self.navigate(page, url)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(anyhow!(
                    "Navigation timeout of {} ms exceeded",
                    self.story_timeout.as_millis()
                ))
            }
        }

        self.wait_for_render(page).await;
        sleep(self.settle_delay).await;

        page.evaluate_expression(EXTRACT_JS)
            .await
            .context("Failed to evaluate extraction script")?
            .into_value::<StoryPayload>()
            .context("Unexpected extraction result")
    }
}

#[async_trait]
impl StoryExtractor for ChromeExtractor {
    async fn extract(&self, base_url: &str, story_id: &str) -> anyhow::Result<ExtractedStory> {
        let url = story_url(base_url, story_id)?;
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open page")?;

        let result = self.extract_on_page(&page, &url).await;

        if let Err(e) = page.close().await {
            debug!("Failed to close page for {}: {}", story_id, e);
        }

        let payload = result?;
        Ok(ExtractedStory {
            story_id: story_id.to_string(),
            html: payload.html,
            styles: payload.styles,
            computed_tokens: payload.computed_tokens,
        })
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.browser.close().await.context("Failed to close browser")?;
        self.browser
            .wait()
            .await
            .context("Failed waiting for browser exit")?;
        Ok(())
    }
}

impl Drop for ChromeExtractor {
    fn drop(&mut self) {
        // the browser child itself is killed when `Browser` drops
        self.handler.abort();
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let candidates: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        ]
    } else if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ]
    };
    candidates.iter().map(PathBuf::from).collect()
}

/// Locate a Chrome/Chromium binary: `CHROME_EXECUTABLE_PATH`, then
/// `PUPPETEER_EXECUTABLE_PATH`, then the usual install locations.
pub fn find_browser_executable() -> Result<PathBuf> {
    for var in ["CHROME_EXECUTABLE_PATH", "PUPPETEER_EXECUTABLE_PATH"] {
        if let Ok(value) = std::env::var(var) {
            let path = PathBuf::from(value.trim());
            if path.is_file() {
                return Ok(path);
            }
            warn!("{} points at {}, which does not exist", var, path.display());
        }
    }

    let candidates = candidate_paths();
    if let Some(found) = candidates.iter().find(|p| p.is_file()) {
        return Ok(found.clone());
    }

    let tried: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
    Err(SwatchError::Config(format!(
        "No Chrome or Chromium executable found. Set CHROME_EXECUTABLE_PATH or install Chrome. Looked in: {}",
        tried.join(", ")
    )))
}
