use crate::config::IdentityConfig;
use rand::Rng;

/// User agents to rotate through so consecutive sessions do not share a fingerprint
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36 Edg/121.0.0.0",
];

pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())]
}

/// The face a transport session shows to a site: user agent plus viewport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_agent: String,
    pub viewport: (u32, u32),
}

impl Identity {
    /// Pick a user agent from the pool and a viewport inside the configured bounds
    pub fn random(config: &IdentityConfig) -> Self {
        let mut rng = rand::thread_rng();
        let pick = |rng: &mut rand::rngs::ThreadRng, min: u32, max: u32| {
            if max <= min {
                min
            } else {
                rng.gen_range(min..=max)
            }
        };
        let width = pick(&mut rng, config.min_width, config.max_width);
        let height = pick(&mut rng, config.min_height, config.max_height);

        Self {
            user_agent: random_user_agent().to_string(),
            viewport: (width, height),
        }
    }
}

/// Injected into every browser page before content is read.
/// Hides the automation markers headless Chrome exposes and perturbs the
/// WebGL and canvas fingerprints.
pub const STEALTH_SCRIPT: &str = r#"
(() => {
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    window.chrome = window.chrome || { runtime: {} };
    Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
    Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });

    const originalQuery = window.navigator.permissions && window.navigator.permissions.query;
    if (originalQuery) {
        window.navigator.permissions.query = (parameters) =>
            parameters.name === 'notifications'
                ? Promise.resolve({ state: Notification.permission })
                : originalQuery(parameters);
    }

    if (window.WebGLRenderingContext) {
        const getParameter = WebGLRenderingContext.prototype.getParameter;
        WebGLRenderingContext.prototype.getParameter = function(parameter) {
            if (parameter === 37445) return 'Intel Inc.';
            if (parameter === 37446) return 'Intel Iris OpenGL Engine';
            return getParameter.call(this, parameter);
        };
    }

    const toDataURL = HTMLCanvasElement.prototype.toDataURL;
    HTMLCanvasElement.prototype.toDataURL = function() {
        const context = this.getContext('2d');
        if (context && this.width > 0 && this.height > 0) {
            const image = context.getImageData(0, 0, this.width, this.height);
            for (let i = 0; i < image.data.length; i += 4) {
                image.data[i] = image.data[i] ^ 0x1;
            }
            context.putImageData(image, 0, 0);
        }
        return toDataURL.apply(this, arguments);
    };

    delete window.cdc_adoQpoasnfa76pfcZLmcfl_Array;
    delete window.cdc_adoQpoasnfa76pfcZLmcfl_Promise;
    delete window.cdc_adoQpoasnfa76pfcZLmcfl_Symbol;
    return true;
})()
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_user_agent_from_pool() {
        for _ in 0..20 {
            assert!(USER_AGENTS.contains(&random_user_agent()));
        }
    }

    #[test]
    fn test_viewport_within_bounds() {
        let config = IdentityConfig::default();
        for _ in 0..100 {
            let identity = Identity::random(&config);
            let (w, h) = identity.viewport;
            assert!((1024..=1920).contains(&w));
            assert!((768..=1080).contains(&h));
            assert!(USER_AGENTS.contains(&identity.user_agent.as_str()));
        }
    }

    #[test]
    fn test_degenerate_bounds() {
        let config = IdentityConfig {
            min_width: 1280,
            max_width: 1280,
            min_height: 900,
            max_height: 100,
        };
        assert_eq!(Identity::random(&config).viewport, (1280, 900));
    }
}
