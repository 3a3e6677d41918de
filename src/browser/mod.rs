//! Headless Chrome automation for sources that render listings with JavaScript
//! or sit behind anti-bot interstitials.
//!
//! Everything here is blocking; `transport::BrowserTransport` drives it from
//! `tokio::task::spawn_blocking`.
//!
//! # Example
//!
//! ```no_run
//! use opportunity_scraper::browser::{BrowserConfig, BrowserManager, BrowserScraper};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = BrowserManager::new(BrowserConfig::stealth_mode())?;
//! let scraper = BrowserScraper::new(manager.new_tab()?);
//!
//! scraper.navigate("https://example.com")?;
//! scraper.wait_for_selector("h1")?;
//! let html = scraper.get_html()?;
//!
//! println!("Extracted {} bytes of HTML", html.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod manager;
pub mod scraper;

pub use config::BrowserConfig;
pub use manager::{BrowserError, BrowserManager};
pub use scraper::BrowserScraper;
