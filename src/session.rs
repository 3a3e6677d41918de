//! One adapter's view of the network: a transport plus block detection,
//! retry, pacing, stats and the debug dump.

use crate::anti_detection::{BlockDetector, RetryPolicy};
use crate::config::{PacingConfig, ScraperConfig};
use crate::error::{RecordError, ScrapeError, TransportError};
use crate::metrics::ScrapeStats;
use crate::models::Opportunity;
use crate::transport::{Page, Transport};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;

/// Extra work done on a listing page before it is parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListingPlan {
    pub interact: bool,
    pub scroll: bool,
}

impl ListingPlan {
    pub const PLAIN: ListingPlan = ListingPlan {
        interact: false,
        scroll: false,
    };
    pub const SCROLL: ListingPlan = ListingPlan {
        interact: false,
        scroll: true,
    };
    pub const HUMAN: ListingPlan = ListingPlan {
        interact: true,
        scroll: true,
    };
}

pub struct SourceSession {
    source: String,
    slug: String,
    transport: Box<dyn Transport>,
    detector: BlockDetector,
    retry: RetryPolicy,
    pacing: PacingConfig,
    fetch_timeout: Duration,
    dump_dir: Option<PathBuf>,
    stats: ScrapeStats,
    last_content: Option<String>,
}

impl SourceSession {
    pub fn new(source: &str, slug: &str, transport: Box<dyn Transport>, config: &ScraperConfig) -> Self {
        let fetch_timeout = if transport.name() == "browser" {
            Duration::from_secs(config.transport.browser_timeout_secs)
        } else {
            config.transport.http_timeout()
        };

        Self {
            source: source.to_string(),
            slug: slug.to_string(),
            transport,
            detector: BlockDetector::new(&config.anti_detection),
            retry: RetryPolicy::from_config(&config.anti_detection),
            pacing: config.pacing.clone(),
            fetch_timeout,
            dump_dir: config.debug.dump_dir.clone(),
            stats: ScrapeStats::default(),
            last_content: None,
        }
    }

    /// Pages without `keyword` count as blocked
    pub fn with_expected_keyword(mut self, keyword: &str) -> Self {
        self.detector = self.detector.expecting(keyword);
        self
    }

    /// Skip block detection entirely (JSON APIs)
    pub fn undefended(mut self) -> Self {
        self.detector = self.detector.disabled();
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn stats(&self) -> &ScrapeStats {
        &self.stats
    }

    pub async fn open(&mut self) -> Result<(), TransportError> {
        self.transport.open().await?;
        debug!("[{}] {} transport open", self.source, self.transport.name());
        Ok(())
    }

    pub async fn close(&mut self) {
        self.transport.close().await;
    }

    /// Fetch one listing page under the retry policy.
    ///
    /// Transport failures skip the page at once. Blocked responses are retried
    /// after a growing backoff until the attempt ceiling, then the page is skipped.
    /// A skip is logged and counted, never raised.
    pub async fn fetch_page(&mut self, url: &str, wait_for: Option<&str>) -> Option<Page> {
        self.stats.pages_requested += 1;
        let mut attempt = 1;

        loop {
            let page = match self.transport.fetch(url, wait_for, self.fetch_timeout).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("[{}] Skipping {}: {}", self.source, url, e);
                    self.stats.pages_skipped_unavailable += 1;
                    return None;
                }
            };
            self.last_content = Some(page.content.clone());

            let Some(reason) = self.detector.check_page(&page) else {
                self.stats.pages_fetched += 1;
                return Some(page);
            };
            self.stats.blocked_responses += 1;

            if !self.retry.allows_another(attempt) {
                warn!(
                    "[{}] Still blocked on {} after {} attempts ({}), skipping page",
                    self.source, url, attempt, reason
                );
                self.stats.pages_skipped_blocked += 1;
                self.dump_debug().await;
                return None;
            }

            let delay = self.retry.delay_after(attempt);
            warn!(
                "[{}] Blocked on {} ({}), attempt {}/{}, backing off {}ms",
                self.source,
                url,
                reason,
                attempt,
                self.retry.max_attempts(),
                delay.as_millis()
            );
            sleep(delay).await;
            self.stats.retries += 1;
            attempt += 1;
        }
    }

    /// Fetch a listing page, then interact and scroll as the plan asks and
    /// re-read the document
    pub async fn fetch_listing(&mut self, url: &str, wait_for: Option<&str>, plan: ListingPlan) -> Option<Page> {
        let page = self.fetch_page(url, wait_for).await?;
        if plan == ListingPlan::PLAIN {
            return Some(page);
        }

        if plan.interact {
            if let Err(e) = self.transport.simulate_interaction().await {
                debug!("[{}] Interaction failed: {}", self.source, e);
            }
        }
        if plan.scroll {
            if let Err(e) = self.transport.scroll_to_bottom(self.pacing.scroll_pause).await {
                debug!("[{}] Scrolling failed: {}", self.source, e);
            }
        }

        match self.transport.current_page().await {
            Ok(Some(updated)) => {
                self.last_content = Some(updated.content.clone());
                Some(updated)
            }
            Ok(None) => Some(page),
            Err(e) => {
                debug!("[{}] Could not re-read {}: {}", self.source, url, e);
                Some(page)
            }
        }
    }

    /// Single-attempt fetch for a detail page. Callers fall back to sentinels on None.
    pub async fn fetch_detail(&mut self, url: &str, wait_for: Option<&str>) -> Option<Page> {
        let page = match self.transport.fetch(url, wait_for, self.fetch_timeout).await {
            Ok(page) => page,
            Err(e) => {
                debug!("[{}] Detail page {} unavailable: {}", self.source, url, e);
                return None;
            }
        };
        if let Some(reason) = self.detector.check_page(&page) {
            debug!("[{}] Detail page {} blocked ({})", self.source, url, reason);
            self.stats.blocked_responses += 1;
            return None;
        }
        Some(page)
    }

    /// Visit a landing page first and behave like a person there.
    /// A blocked or unreachable landing page ends the run.
    pub async fn warm_up(&mut self, url: &str) -> Result<(), ScrapeError> {
        let page = self.transport.fetch(url, None, self.fetch_timeout).await?;
        self.last_content = Some(page.content.clone());

        if let Some(reason) = self.detector.check_page(&page) {
            self.stats.blocked_responses += 1;
            return Err(ScrapeError::Adapter(format!("blocked on landing page {}: {}", url, reason)));
        }
        if let Err(e) = self.transport.simulate_interaction().await {
            debug!("[{}] Interaction failed: {}", self.source, e);
        }
        sleep(self.pacing.between_pages.sample()).await;
        Ok(())
    }

    /// The shared page loop: pages 0..num_pages in order, a randomized pause
    /// between them, absent pages contributing nothing and bad fragments dropped
    /// one at a time.
    pub async fn collect_pages<T, U, P>(
        &mut self,
        num_pages: u32,
        wait_for: Option<&str>,
        plan: ListingPlan,
        mut page_url: U,
        mut parse: P,
    ) -> Vec<Opportunity>
    where
        T: Into<Opportunity> + Send,
        U: FnMut(u32) -> String + Send,
        P: FnMut(&Page) -> Vec<Result<T, RecordError>> + Send,
    {
        let mut records = Vec::new();

        for page_index in 0..num_pages {
            if page_index > 0 {
                self.pace().await;
            }
            let url = page_url(page_index);
            let Some(page) = self.fetch_listing(&url, wait_for, plan).await else {
                continue;
            };

            let before = records.len();
            self.keep(parse(&page), &mut records);
            info!(
                "[{}] Page {}: {} records",
                self.source,
                page_index + 1,
                records.len() - before
            );
        }

        records
    }

    /// Move finished records into `out`, counting and logging the dropped ones
    pub fn keep<T: Into<Opportunity>>(&mut self, results: Vec<Result<T, RecordError>>, out: &mut Vec<Opportunity>) {
        for result in results {
            match result {
                Ok(record) => out.push(record.into()),
                Err(e) => self.record_dropped(&e),
            }
        }
    }

    pub fn record_dropped(&mut self, error: &RecordError) {
        debug!("[{}] Dropped fragment: {}", self.source, error);
        self.stats.fragments_dropped += 1;
    }

    /// Randomized pause between listing pages
    pub async fn pace(&self) {
        sleep(self.pacing.between_pages.sample()).await;
    }

    /// Write the last fetched content to `{dump_dir}/debug_{source}.html`.
    /// Failures are logged and otherwise ignored.
    pub async fn dump_debug(&self) -> Option<PathBuf> {
        let dir = self.dump_dir.as_ref()?;
        let content = self.last_content.as_ref()?;
        let path = dir.join(format!("debug_{}.html", self.slug));

        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, content).await
        };
        match written.await {
            Ok(()) => {
                info!("[{}] Wrote debug dump to {}", self.source, path.display());
                Some(path)
            }
            Err(e) => {
                warn!("[{}] Could not write debug dump {}: {}", self.source, path.display(), e);
                None
            }
        }
    }
}
