use super::manager::BrowserError;
use headless_chrome::Tab;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Blocking page operations on one tab.
/// Cheap to clone so async callers can move a handle into `spawn_blocking`.
#[derive(Clone)]
pub struct BrowserScraper {
    tab: Arc<Tab>,
    default_timeout: Duration,
}

impl BrowserScraper {
    pub fn new(tab: Arc<Tab>) -> Self {
        Self {
            tab,
            default_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(tab: Arc<Tab>, timeout: Duration) -> Self {
        Self {
            tab,
            default_timeout: timeout,
        }
    }

    /// Navigate to a URL and wait for page load
    pub fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.tab
            .navigate_to(url)
            .map_err(|e| BrowserError::NavigationError(format!("Failed to navigate to {}: {}", url, e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| BrowserError::NavigationError(format!("Navigation timeout for {}: {}", url, e)))?;

        Ok(())
    }

    pub fn wait_for_selector(&self, selector: &str) -> Result<(), BrowserError> {
        self.wait_for_selector_with_timeout(selector, self.default_timeout)
    }

    /// Poll `document.querySelector` every 100ms until it matches or `timeout` passes
    pub fn wait_for_selector_with_timeout(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        let start = Instant::now();
        let script = format!(
            r#"document.querySelector('{}') !== null"#,
            selector.replace('\\', "\\\\").replace('\'', "\\'")
        );

        loop {
            if let Ok(result) = self.tab.evaluate(&script, false) {
                if result.value.and_then(|v| v.as_bool()) == Some(true) {
                    return Ok(());
                }
            }
            if start.elapsed() > timeout {
                return Err(BrowserError::Timeout(format!("Waiting for selector: {}", selector)));
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    pub fn get_html(&self) -> Result<String, BrowserError> {
        self.tab
            .get_content()
            .map_err(|e| BrowserError::HtmlExtractionError(e.to_string()))
    }

    pub fn title(&self) -> String {
        self.tab.get_title().unwrap_or_default()
    }

    /// Final URL after redirects
    pub fn current_url(&self) -> String {
        self.tab.get_url()
    }

    /// Run a script for its side effects, discarding the value
    pub fn run_script(&self, script: &str) -> Result<(), BrowserError> {
        self.tab
            .evaluate(script, false)
            .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;
        Ok(())
    }

    fn evaluate_number(&self, script: &str) -> Result<f64, BrowserError> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;
        result
            .value
            .and_then(|v| v.as_f64())
            .ok_or_else(|| BrowserError::JavaScriptError(format!("Script returned no number: {}", script)))
    }

    /// Scroll until the document height stops growing, or `max_rounds` is reached.
    /// `pause` is called once per round to pick the wait before re-measuring.
    pub fn scroll_to_bottom<F>(&self, max_rounds: u32, mut pause: F) -> Result<u32, BrowserError>
    where
        F: FnMut() -> Duration,
    {
        const HEIGHT: &str = "document.body ? document.body.scrollHeight : 0";

        let mut last_height = self.evaluate_number(HEIGHT)?;
        for round in 1..=max_rounds {
            self.run_script("window.scrollTo(0, document.body.scrollHeight);")?;
            std::thread::sleep(pause());

            let height = self.evaluate_number(HEIGHT)?;
            if height == last_height {
                return Ok(round);
            }
            last_height = height;
        }
        Ok(max_rounds)
    }

    /// A handful of human-looking actions: scrolling a random link into view or
    /// moving the mouse, each followed by a pause, then a small scroll
    pub fn simulate_interaction<F>(&self, mut pause: F) -> Result<(), BrowserError>
    where
        F: FnMut() -> Duration,
    {
        let actions = rand::thread_rng().gen_range(2..=5);
        for _ in 0..actions {
            let script = if rand::thread_rng().gen_bool(0.5) {
                r#"(() => {
                    const links = document.querySelectorAll('a');
                    if (links.length > 0) {
                        links[Math.floor(Math.random() * links.length)].scrollIntoView({ block: 'center' });
                    }
                    return true;
                })()"#
                    .to_string()
            } else {
                let (x, y) = {
                    let mut rng = rand::thread_rng();
                    (rng.gen_range(50..900), rng.gen_range(50..700))
                };
                format!(
                    "document.dispatchEvent(new MouseEvent('mousemove', {{ clientX: {}, clientY: {}, bubbles: true }})); true",
                    x, y
                )
            };
            // A failed gesture is not worth abandoning the page for
            if let Err(e) = self.run_script(&script) {
                log::debug!("Interaction step failed: {}", e);
            }
            std::thread::sleep(pause());
        }

        let offset = rand::thread_rng().gen_range(100..=500);
        self.run_script(&format!("window.scrollTo(0, {});", offset))
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{BrowserConfig, BrowserManager};

    #[test]
    #[ignore] // Requires Chrome to be installed
    fn test_html_extraction() {
        let manager = BrowserManager::new(BrowserConfig::stealth_mode()).unwrap();
        let scraper = BrowserScraper::new(manager.new_tab().unwrap());

        scraper.navigate("https://example.com").unwrap();
        scraper.wait_for_selector("h1").unwrap();
        let html = scraper.get_html().unwrap();
        assert!(html.contains("Example"));
        assert!(scraper.current_url().starts_with("https://example.com"));
    }

    #[test]
    #[ignore] // Requires Chrome to be installed
    fn test_scroll_converges() {
        let manager = BrowserManager::new(BrowserConfig::stealth_mode()).unwrap();
        let scraper = BrowserScraper::new(manager.new_tab().unwrap());

        scraper.navigate("https://example.com").unwrap();
        let rounds = scraper.scroll_to_bottom(10, || Duration::from_millis(50)).unwrap();
        assert!(rounds <= 2);
    }
}
