use crate::anti_detection::Identity;
use crate::config::TransportConfig;
use std::time::Duration;

/// Configuration for browser instances
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,

    /// Browser window size
    pub window_size: (u32, u32),

    /// User agent reported by the browser
    pub user_agent: Option<String>,

    /// Navigation timeout in seconds
    pub timeout_seconds: u64,

    /// Disable image loading for performance
    pub disable_images: bool,

    /// Additional Chrome flags
    pub chrome_flags: Vec<String>,

    /// How long Chrome may sit idle between commands before the connection is dropped.
    /// Block backoffs can run for minutes, so this must outlast them.
    pub idle_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1920, 1080),
            user_agent: None,
            timeout_seconds: 30,
            disable_images: true,
            chrome_flags: vec![],
            idle_timeout: Duration::from_secs(600),
        }
    }
}

const STEALTH_FLAGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-dev-shm-usage",
    "--disable-infobars",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-extensions",
    "--lang=en-US,en",
];

impl BrowserConfig {
    /// Chrome flags that suppress the usual automation markers
    pub fn stealth_mode() -> Self {
        Self {
            chrome_flags: STEALTH_FLAGS.iter().map(|f| f.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Stealth configuration for one transport session
    pub fn for_session(settings: &TransportConfig, identity: &Identity) -> Self {
        let mut config = Self::stealth_mode();
        config.headless = settings.browser_headless;
        config.disable_images = settings.browser_disable_images;
        config.timeout_seconds = settings.browser_timeout_secs;
        config.window_size = identity.viewport;
        config.user_agent = Some(identity.user_agent.clone());
        config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Every argument passed to Chrome on launch, derived flags included
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = self.chrome_flags.clone();
        if let Some(ua) = &self.user_agent {
            args.push(format!("--user-agent={}", ua));
        }
        if self.disable_images {
            args.push("--blink-settings=imagesEnabled=false".to_string());
        }
        args
    }
}
