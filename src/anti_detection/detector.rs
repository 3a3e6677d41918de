use crate::config::AntiDetectionConfig;
use crate::extract::html::visible_text;
use crate::transport::Page;
use scraper::Html;
use std::fmt;

/// Why a page was judged to be a block or challenge page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// A block phrase occurred in the visible text or the title
    Indicator(String),
    /// The final URL path carries a challenge term
    ChallengeUrl(String),
    /// The source's expected keyword is missing from the content
    MissingKeyword(String),
    /// The server answered with a blocking status code
    Status(u16),
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::Indicator(phrase) => write!(f, "block indicator '{}'", phrase),
            BlockReason::ChallengeUrl(term) => write!(f, "challenge url term '{}'", term),
            BlockReason::MissingKeyword(kw) => write!(f, "expected keyword '{}' missing", kw),
            BlockReason::Status(code) => write!(f, "status {}", code),
        }
    }
}

const BLOCKING_STATUSES: &[u16] = &[403, 429, 503];

/// Decides whether fetched content is a real page or an anti-bot interstitial
#[derive(Debug, Clone)]
pub struct BlockDetector {
    indicators: Vec<String>,
    challenge_terms: Vec<String>,
    expected_keyword: Option<String>,
    enabled: bool,
}

impl BlockDetector {
    pub fn new(config: &AntiDetectionConfig) -> Self {
        Self {
            indicators: lowered(&config.block_indicators),
            challenge_terms: lowered(&config.challenge_terms),
            expected_keyword: None,
            enabled: true,
        }
    }

    /// Also treat a page as blocked when `keyword` does not occur in it
    pub fn expecting(mut self, keyword: &str) -> Self {
        let keyword = keyword.trim().to_lowercase();
        self.expected_keyword = if keyword.is_empty() { None } else { Some(keyword) };
        self
    }

    /// Turn detection off, for JSON APIs where block phrases are ordinary data
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn is_blocked(&self, content: &str, title: &str, url: &str) -> bool {
        self.verdict(content, title, url).is_some()
    }

    /// The first reason the page looks blocked, or None for a usable page
    pub fn verdict(&self, content: &str, title: &str, url: &str) -> Option<BlockReason> {
        if !self.enabled {
            return None;
        }

        let doc = Html::parse_document(content);
        let haystack = format!("{} {}", title, visible_text(&doc)).to_lowercase();
        if let Some(phrase) = self.indicators.iter().find(|p| haystack.contains(p.as_str())) {
            return Some(BlockReason::Indicator(phrase.clone()));
        }

        if let Some(term) = self.challenge_term_in(url) {
            return Some(BlockReason::ChallengeUrl(term));
        }

        if let Some(keyword) = &self.expected_keyword {
            if !content.to_lowercase().contains(keyword.as_str()) {
                return Some(BlockReason::MissingKeyword(keyword.clone()));
            }
        }

        None
    }

    /// Verdict for a fetched page, including its status code
    pub fn check_page(&self, page: &Page) -> Option<BlockReason> {
        if !self.enabled {
            return None;
        }
        if let Some(status) = page.status.filter(|s| BLOCKING_STATUSES.contains(s)) {
            return Some(BlockReason::Status(status));
        }
        self.verdict(&page.content, &page.title, &page.url)
    }

    /// Challenge terms must match a whole path token: `/security-check` and
    /// `/captcha` count, `/checkout` and `/research` do not
    fn challenge_term_in(&self, url: &str) -> Option<String> {
        let path = match url::Url::parse(url) {
            Ok(parsed) => parsed.path().to_lowercase(),
            Err(_) => url.to_lowercase(),
        };
        path.split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .find_map(|token| self.challenge_terms.iter().find(|t| t.as_str() == token).cloned())
    }
}

fn lowered(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}
