//! Page acquisition: a plain HTTP client for static pages and JSON APIs, and a
//! headless browser for everything that needs JavaScript.

use crate::anti_detection::{Identity, STEALTH_SCRIPT};
use crate::browser::{BrowserConfig, BrowserError, BrowserManager, BrowserScraper};
use crate::config::{DelayRange, IdentityConfig, PacingConfig, TransportConfig};
use crate::error::TransportError;
use crate::http_client::{json_headers, HttpClient, HttpClientConfig};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::HeaderMap;
use std::time::Duration;

/// Raw result of one fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub content: String,
    pub title: String,
    /// Final URL, after redirects
    pub url: String,
    /// HTTP status when the transport knows it
    pub status: Option<u16>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;

    /// Acquire the underlying session (build the client, launch the browser)
    async fn open(&mut self) -> Result<(), TransportError>;

    async fn fetch(&mut self, url: &str, wait_for: Option<&str>, timeout: Duration) -> Result<Page, TransportError>;

    /// Scroll until no new content loads. No-op for transports without a viewport.
    async fn scroll_to_bottom(&mut self, _pause: DelayRange) -> Result<(), TransportError> {
        Ok(())
    }

    async fn simulate_interaction(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Re-read the current document after scrolling or interaction.
    /// None when the transport has no live document.
    async fn current_page(&mut self) -> Result<Option<Page>, TransportError> {
        Ok(None)
    }

    /// Release the session. Safe to call more than once.
    async fn close(&mut self);
}

/// reqwest-backed transport
pub struct StaticTransport {
    config: HttpClientConfig,
    headers: Option<HeaderMap>,
    client: Option<HttpClient>,
}

impl StaticTransport {
    pub fn new(settings: &TransportConfig) -> Self {
        Self {
            config: HttpClientConfig::from_transport(settings),
            headers: None,
            client: None,
        }
    }

    /// Ask for JSON instead of HTML documents
    pub fn accepting_json(mut self) -> Self {
        self.headers = Some(json_headers());
        self
    }
}

#[async_trait]
impl Transport for StaticTransport {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn open(&mut self) -> Result<(), TransportError> {
        if self.client.is_none() {
            self.client = Some(HttpClient::with_config(self.config.clone())?);
        }
        Ok(())
    }

    async fn fetch(&mut self, url: &str, _wait_for: Option<&str>, timeout: Duration) -> Result<Page, TransportError> {
        let client = self.client.as_ref().ok_or(TransportError::NotOpen)?;
        Ok(client.get_page(url, timeout, self.headers.as_ref()).await?)
    }

    async fn close(&mut self) {
        self.client = None;
    }
}

struct BrowserSession {
    // Kept alive for as long as the tab is in use; dropping it kills Chrome
    _manager: BrowserManager,
    scraper: BrowserScraper,
}

/// headless_chrome-backed transport with a randomized identity per session
pub struct BrowserTransport {
    settings: TransportConfig,
    identity: IdentityConfig,
    pacing: PacingConfig,
    session: Option<BrowserSession>,
}

impl BrowserTransport {
    pub fn new(settings: &TransportConfig, identity: &IdentityConfig, pacing: &PacingConfig) -> Self {
        Self {
            settings: settings.clone(),
            identity: identity.clone(),
            pacing: pacing.clone(),
            session: None,
        }
    }

    fn scraper(&self) -> Result<BrowserScraper, TransportError> {
        self.session
            .as_ref()
            .map(|s| s.scraper.clone())
            .ok_or(TransportError::NotOpen)
    }
}

/// headless_chrome blocks on every call; keep it off the async workers
async fn run_blocking<T, F>(f: F) -> Result<T, TransportError>
where
    F: FnOnce() -> Result<T, BrowserError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| TransportError::Worker(e.to_string()))?
        .map_err(TransportError::from)
}

async fn read_page(scraper: BrowserScraper) -> Result<Page, TransportError> {
    run_blocking(move || {
        Ok(Page {
            content: scraper.get_html()?,
            title: scraper.title(),
            url: scraper.current_url(),
            status: None,
        })
    })
    .await
}

#[async_trait]
impl Transport for BrowserTransport {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn open(&mut self) -> Result<(), TransportError> {
        if self.session.is_some() {
            return Ok(());
        }
        let identity = Identity::random(&self.identity);
        let config = BrowserConfig::for_session(&self.settings, &identity);
        let timeout = config.timeout();

        let session = run_blocking(move || {
            let manager = BrowserManager::new(config)?;
            let tab = manager.new_tab()?;
            Ok(BrowserSession {
                _manager: manager,
                scraper: BrowserScraper::with_timeout(tab, timeout),
            })
        })
        .await?;

        info!(
            "Launched browser session ({}x{}, {})",
            identity.viewport.0, identity.viewport.1, identity.user_agent
        );
        self.session = Some(session);
        Ok(())
    }

    async fn fetch(&mut self, url: &str, wait_for: Option<&str>, timeout: Duration) -> Result<Page, TransportError> {
        let scraper = self.scraper()?;
        let settle = self.pacing.settle;
        let wait_timeout = self.settings.wait_timeout().min(timeout);
        let target = url.to_string();
        let selector = wait_for.map(str::to_string);

        let work = async move {
            let tab = scraper.clone();
            run_blocking(move || {
                tab.navigate(&target)?;
                if let Err(e) = tab.run_script(STEALTH_SCRIPT) {
                    debug!("Stealth script failed on {}: {}", target, e);
                }
                if let Some(selector) = selector {
                    // Whatever rendered is still returned; the block detector judges it
                    if let Err(e) = tab.wait_for_selector_with_timeout(&selector, wait_timeout) {
                        debug!("{} on {}", e, target);
                    }
                }
                Ok(())
            })
            .await?;

            tokio::time::sleep(settle.sample()).await;
            read_page(scraper).await
        };

        tokio::time::timeout(timeout, work)
            .await
            .map_err(|_| TransportError::Timeout(timeout, url.to_string()))?
    }

    async fn scroll_to_bottom(&mut self, pause: DelayRange) -> Result<(), TransportError> {
        let scraper = self.scraper()?;
        let max_rounds = self.settings.max_scroll_rounds;
        let rounds = run_blocking(move || scraper.scroll_to_bottom(max_rounds, || pause.sample())).await?;
        if rounds >= max_rounds {
            warn!("Scrolling stopped after {} rounds without the page settling", rounds);
        }
        Ok(())
    }

    async fn simulate_interaction(&mut self) -> Result<(), TransportError> {
        let scraper = self.scraper()?;
        let pause = self.pacing.interaction;
        run_blocking(move || scraper.simulate_interaction(|| pause.sample())).await
    }

    async fn current_page(&mut self) -> Result<Option<Page>, TransportError> {
        let scraper = self.scraper()?;
        read_page(scraper).await.map(Some)
    }

    async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            // Dropping the manager waits for Chrome to exit
            if let Err(e) = tokio::task::spawn_blocking(move || drop(session)).await {
                warn!("Failed to shut down browser cleanly: {}", e);
            }
        }
    }
}

impl Drop for BrowserTransport {
    fn drop(&mut self) {
        if self.session.is_some() {
            debug!("Browser transport dropped while open; releasing Chrome");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_fetch_before_open() {
        let mut transport = StaticTransport::new(&TransportConfig::default());
        let result = transport.fetch("https://example.com", None, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(TransportError::NotOpen)));
    }

    #[tokio::test]
    async fn test_static_open_close_idempotent() {
        let mut transport = StaticTransport::new(&TransportConfig::default());
        transport.open().await.unwrap();
        transport.open().await.unwrap();
        assert!(transport.current_page().await.unwrap().is_none());
        transport.close().await;
        transport.close().await;
    }

    #[tokio::test]
    async fn test_browser_operations_require_open() {
        let mut transport = BrowserTransport::new(
            &TransportConfig::default(),
            &IdentityConfig::default(),
            &PacingConfig::default(),
        );
        assert!(matches!(transport.simulate_interaction().await, Err(TransportError::NotOpen)));
        assert!(matches!(transport.current_page().await, Err(TransportError::NotOpen)));
        transport.close().await;
    }

    #[tokio::test]
    #[ignore] // Requires Chrome
    async fn test_browser_fetch() {
        let mut transport = BrowserTransport::new(
            &TransportConfig::default(),
            &IdentityConfig::default(),
            &PacingConfig::default(),
        );
        transport.open().await.unwrap();
        let page = transport
            .fetch("https://example.com", Some("h1"), Duration::from_secs(30))
            .await
            .unwrap();
        assert!(page.content.contains("Example Domain"));
        transport.close().await;
    }
}
