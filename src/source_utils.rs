use crate::config::ScraperConfig;
use crate::transport::{BrowserTransport, StaticTransport, Transport};

/// How a source's pages are fetched
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Plain HTTP (fast, but no JavaScript and easier to block)
    Static,
    /// Static HTTP asking for JSON
    Json,
    /// Headless browser (slow, but renders JavaScript and passes most interstitials)
    Browser,
}

impl FetchStrategy {
    /// The strategy actually used once configuration is applied.
    /// Browser sources fall back to static HTTP when the browser is switched off.
    pub fn effective(self, config: &ScraperConfig) -> FetchStrategy {
        match self {
            FetchStrategy::Browser if !config.transport.browser_enabled() => FetchStrategy::Static,
            other => other,
        }
    }
}

/// Build the transport for a source
pub fn build_transport(strategy: FetchStrategy, config: &ScraperConfig) -> Box<dyn Transport> {
    match strategy.effective(config) {
        FetchStrategy::Static => Box::new(StaticTransport::new(&config.transport)),
        FetchStrategy::Json => Box::new(StaticTransport::new(&config.transport).accepting_json()),
        FetchStrategy::Browser => Box::new(BrowserTransport::new(
            &config.transport,
            &config.identity,
            &config.pacing,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_falls_back_when_disabled() {
        let config = ScraperConfig::instant();
        assert_eq!(FetchStrategy::Browser.effective(&config), FetchStrategy::Static);
        assert_eq!(FetchStrategy::Json.effective(&config), FetchStrategy::Json);
        assert_eq!(build_transport(FetchStrategy::Browser, &config).name(), "static");
    }

    #[test]
    fn test_static_strategy_unchanged() {
        let config = ScraperConfig::default();
        assert_eq!(FetchStrategy::Static.effective(&config), FetchStrategy::Static);
        assert_eq!(build_transport(FetchStrategy::Static, &config).name(), "static");
    }
}
