use crate::error::ConfigError;
use rand::Rng;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "config.toml";
const BROWSER_ENV_VAR: &str = "OPPORTUNITY_SCRAPER_USE_BROWSER";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScraperConfig {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub anti_detection: AntiDetectionConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

/// Inclusive bounds for a randomized delay, in milliseconds
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange { min_ms: 0, max_ms: 0 };

    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Pick a delay uniformly inside the range
    pub fn sample(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        let mut rng = rand::thread_rng();
        Duration::from_millis(rng.gen_range(self.min_ms..=self.max_ms))
    }

    /// Multiply both bounds by `factor`, clamping each to `cap_ms`
    pub fn scaled(&self, factor: f64, cap_ms: u64) -> DelayRange {
        let scale = |ms: u64| ((ms as f64 * factor).round() as u64).min(cap_ms);
        DelayRange {
            min_ms: scale(self.min_ms),
            max_ms: scale(self.max_ms),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    /// Timeout for a single HTTP request in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Retries for 429/5xx responses inside the static transport
    #[serde(default = "default_http_max_retries")]
    pub http_max_retries: usize,

    #[serde(default = "default_initial_retry_delay")]
    pub http_initial_retry_delay_ms: u64,

    #[serde(default = "default_max_retry_delay")]
    pub http_max_retry_delay_ms: u64,

    #[serde(default = "default_true")]
    pub enable_cookies: bool,

    #[serde(default = "default_true")]
    pub enable_compression: bool,

    /// Use headless Chrome for sources that need it
    #[serde(default = "default_true")]
    pub enable_browser: bool,

    #[serde(default = "default_true")]
    pub browser_headless: bool,

    #[serde(default = "default_true")]
    pub browser_disable_images: bool,

    /// Navigation timeout for the browser in seconds
    #[serde(default = "default_browser_timeout")]
    pub browser_timeout_secs: u64,

    /// Upper bound for wait-for-element in seconds
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_secs: u64,

    /// Upper bound on scroll/measure rounds when loading infinite lists
    #[serde(default = "default_max_scroll_rounds")]
    pub max_scroll_rounds: u32,
}

fn default_true() -> bool { true }
fn default_http_timeout() -> u64 { 30 }
fn default_http_max_retries() -> usize { 2 }
fn default_initial_retry_delay() -> u64 { 500 }
fn default_max_retry_delay() -> u64 { 8000 }
fn default_browser_timeout() -> u64 { 30 }
fn default_wait_timeout() -> u64 { 15 }
fn default_max_scroll_rounds() -> u32 { 30 }

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            http_max_retries: default_http_max_retries(),
            http_initial_retry_delay_ms: default_initial_retry_delay(),
            http_max_retry_delay_ms: default_max_retry_delay(),
            enable_cookies: true,
            enable_compression: true,
            enable_browser: true,
            browser_headless: true,
            browser_disable_images: true,
            browser_timeout_secs: default_browser_timeout(),
            wait_timeout_secs: default_wait_timeout(),
            max_scroll_rounds: default_max_scroll_rounds(),
        }
    }
}

impl TransportConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    /// Browser use can be switched off globally with OPPORTUNITY_SCRAPER_USE_BROWSER=0|false
    pub fn browser_enabled(&self) -> bool {
        let env_allows = std::env::var(BROWSER_ENV_VAR)
            .map(|v| v != "0" && v.to_lowercase() != "false")
            .unwrap_or(true);
        self.enable_browser && env_allows
    }
}

/// Bounds for the randomized browser viewport
#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    #[serde(default = "default_min_width")]
    pub min_width: u32,
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    #[serde(default = "default_min_height")]
    pub min_height: u32,
    #[serde(default = "default_max_height")]
    pub max_height: u32,
}

fn default_min_width() -> u32 { 1024 }
fn default_max_width() -> u32 { 1920 }
fn default_min_height() -> u32 { 768 }
fn default_max_height() -> u32 { 1080 }

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            min_width: default_min_width(),
            max_width: default_max_width(),
            min_height: default_min_height(),
            max_height: default_max_height(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AntiDetectionConfig {
    /// Lower-case phrases that mark a page as a block or challenge page
    #[serde(default = "default_block_indicators")]
    pub block_indicators: Vec<String>,

    /// Lower-case URL path terms that mark a redirect to a challenge page
    #[serde(default = "default_challenge_terms")]
    pub challenge_terms: Vec<String>,

    /// Total fetch attempts per page while blocked
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_block_backoff")]
    pub backoff: DelayRange,

    /// Multiplier applied to the backoff bounds for each further attempt
    #[serde(default = "default_backoff_growth")]
    pub backoff_growth: f64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_block_indicators() -> Vec<String> {
    [
        "captcha",
        "security check",
        "please verify you are a human",
        "access denied",
        "checking your browser",
        "cloudflare",
        "ddos protection",
        "unusual traffic",
        "suspicious activity",
        "just a moment",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_challenge_terms() -> Vec<String> {
    ["security", "verify", "check", "captcha", "challenge"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_attempts() -> u32 { 3 }
fn default_block_backoff() -> DelayRange { DelayRange::new(30_000, 60_000) }
fn default_backoff_growth() -> f64 { 1.5 }
fn default_max_backoff() -> u64 { 180_000 }

impl Default for AntiDetectionConfig {
    fn default() -> Self {
        Self {
            block_indicators: default_block_indicators(),
            challenge_terms: default_challenge_terms(),
            max_attempts: default_max_attempts(),
            backoff: default_block_backoff(),
            backoff_growth: default_backoff_growth(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

/// Courtesy delays, all randomized inside their bounds
#[derive(Debug, Deserialize, Clone)]
pub struct PacingConfig {
    /// After a navigation, before reading the page
    #[serde(default = "default_settle")]
    pub settle: DelayRange,
    #[serde(default = "default_between_pages")]
    pub between_pages: DelayRange,
    #[serde(default = "default_scroll_pause")]
    pub scroll_pause: DelayRange,
    /// Pause after each simulated hover or scroll
    #[serde(default = "default_interaction")]
    pub interaction: DelayRange,
    #[serde(default = "default_between_sources")]
    pub between_sources: DelayRange,
}

fn default_settle() -> DelayRange { DelayRange::new(2000, 4000) }
fn default_between_pages() -> DelayRange { DelayRange::new(3000, 5000) }
fn default_scroll_pause() -> DelayRange { DelayRange::new(500, 2500) }
fn default_interaction() -> DelayRange { DelayRange::new(500, 1500) }
fn default_between_sources() -> DelayRange { DelayRange::new(300, 300) }

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            settle: default_settle(),
            between_pages: default_between_pages(),
            scroll_pause: default_scroll_pause(),
            interaction: default_interaction(),
            between_sources: default_between_sources(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OrchestratorConfig {
    /// Run adapters concurrently instead of one after another
    #[serde(default)]
    pub parallel: bool,

    /// Wall-clock budget for the whole batch
    #[serde(default)]
    pub batch_budget_secs: Option<u64>,
}

impl OrchestratorConfig {
    pub fn batch_budget(&self) -> Option<Duration> {
        self.batch_budget_secs.map(Duration::from_secs)
    }
}

/// Source selection by name or slug; an empty `enabled` list means every source
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourcesConfig {
    #[serde(default)]
    pub enabled: Vec<String>,
    #[serde(default)]
    pub disabled: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DebugConfig {
    /// Where `debug_<source>.html` dumps are written; disabled when unset
    #[serde(default)]
    pub dump_dir: Option<PathBuf>,
}

impl ScraperConfig {
    /// Load `config.toml` from the working directory, falling back to defaults
    pub fn load() -> Self {
        let path = Path::new(CONFIG_FILE);
        if !path.exists() {
            return Self::default();
        }
        match Self::from_path(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Ignoring {}: {}", CONFIG_FILE, e);
                Self::default()
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str::<ScraperConfig>(content)?)
    }

    /// Configuration with every randomized delay collapsed to zero and no browser.
    /// Runs are deterministic in timing, which is what tests want.
    pub fn instant() -> Self {
        let mut cfg = Self::default();
        cfg.transport.enable_browser = false;
        cfg.transport.http_max_retries = 0;
        cfg.transport.http_initial_retry_delay_ms = 0;
        cfg.transport.http_max_retry_delay_ms = 0;
        cfg.anti_detection.backoff = DelayRange::ZERO;
        cfg.pacing = PacingConfig {
            settle: DelayRange::ZERO,
            between_pages: DelayRange::ZERO,
            scroll_pause: DelayRange::ZERO,
            interaction: DelayRange::ZERO,
            between_sources: DelayRange::ZERO,
        };
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let cfg = ScraperConfig::from_toml("").unwrap();
        assert_eq!(cfg.anti_detection.max_attempts, 3);
        assert_eq!(cfg.pacing.between_pages, DelayRange::new(3000, 5000));
        assert!(cfg.anti_detection.block_indicators.iter().any(|i| i == "captcha"));
        assert!(cfg.debug.dump_dir.is_none());
        assert!(!cfg.orchestrator.parallel);
    }

    #[test]
    fn test_partial_override() {
        let cfg = ScraperConfig::from_toml(
            r#"
            [anti_detection]
            max_attempts = 5
            backoff = { min_ms = 10, max_ms = 20 }

            [orchestrator]
            parallel = true
            batch_budget_secs = 600

            [sources]
            disabled = ["glassdoor"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.anti_detection.max_attempts, 5);
        assert_eq!(cfg.anti_detection.backoff, DelayRange::new(10, 20));
        assert_eq!(cfg.anti_detection.backoff_growth, 1.5);
        assert_eq!(cfg.orchestrator.batch_budget(), Some(Duration::from_secs(600)));
        assert_eq!(cfg.sources.disabled, vec!["glassdoor".to_string()]);
        assert_eq!(cfg.transport.wait_timeout_secs, 15);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(ScraperConfig::from_toml("transport = 3").is_err());
    }

    #[test]
    fn test_delay_range_sampling() {
        assert_eq!(DelayRange::ZERO.sample(), Duration::ZERO);
        assert_eq!(DelayRange::new(7, 7).sample(), Duration::from_millis(7));
        let range = DelayRange::new(10, 20);
        for _ in 0..50 {
            let d = range.sample().as_millis();
            assert!((10..=20).contains(&d));
        }
    }

    #[test]
    fn test_delay_range_scaling_is_capped() {
        let range = DelayRange::new(1000, 2000);
        assert_eq!(range.scaled(1.5, 10_000), DelayRange::new(1500, 3000));
        assert_eq!(range.scaled(10.0, 5000), DelayRange::new(5000, 5000));
    }

    #[test]
    fn test_instant_config_has_no_delays() {
        let cfg = ScraperConfig::instant();
        assert_eq!(cfg.pacing.between_pages, DelayRange::ZERO);
        assert_eq!(cfg.anti_detection.backoff, DelayRange::ZERO);
        assert!(!cfg.transport.browser_enabled());
    }
}
