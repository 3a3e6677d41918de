use super::config::BrowserConfig;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::{OsStr, OsString};
use std::sync::Arc;

/// Owns one Chrome process; dropping it kills the process
pub struct BrowserManager {
    browser: Browser,
    config: BrowserConfig,
}

impl BrowserManager {
    /// Launch Chrome with the given configuration. Blocking.
    pub fn new(config: BrowserConfig) -> Result<Self, BrowserError> {
        let args: Vec<OsString> = config.launch_args().into_iter().map(OsString::from).collect();
        let launch_options = Self::build_launch_options(&config, &args)?;

        let browser = Browser::new(launch_options)
            .map_err(|e| BrowserError::InitializationError(e.to_string()))?;

        Ok(Self { browser, config })
    }

    fn build_launch_options<'a>(
        config: &BrowserConfig,
        args: &'a [OsString],
    ) -> Result<LaunchOptions<'a>, BrowserError> {
        let arg_refs: Vec<&OsStr> = args.iter().map(OsString::as_os_str).collect();

        LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false)
            .window_size(Some(config.window_size))
            .idle_browser_timeout(config.idle_timeout)
            .args(arg_refs)
            .build()
            .map_err(|e| BrowserError::ConfigurationError(e.to_string()))
    }

    /// Open a tab sized to the configured viewport
    pub fn new_tab(&self) -> Result<Arc<Tab>, BrowserError> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| BrowserError::TabCreationError(e.to_string()))?;

        if let Some(ua) = &self.config.user_agent {
            tab.set_user_agent(ua, Some("en-US,en;q=0.9"), None)
                .map_err(|e| BrowserError::ConfigurationError(e.to_string()))?;
        }
        tab.set_default_timeout(self.config.timeout());
        Ok(tab)
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }
}

/// Errors that can occur during browser operations
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("Browser initialization failed: {0}")]
    InitializationError(String),

    #[error("Browser configuration error: {0}")]
    ConfigurationError(String),

    #[error("Tab creation failed: {0}")]
    TabCreationError(String),

    #[error("Navigation error: {0}")]
    NavigationError(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("JavaScript execution error: {0}")]
    JavaScriptError(String),

    #[error("HTML extraction error: {0}")]
    HtmlExtractionError(String),
}
