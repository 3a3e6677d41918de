use super::{SourceAdapter, SourceId};
use crate::canonical::JobDraft;
use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::extract::dates::posted_date;
use crate::extract::html::{element_lines, first_attr, first_text, fragments};
use crate::extract::text::section_lines;
use crate::extract::urls::{encode, resolve_url};
use crate::extract::{REQUIREMENT_STOPS, REQUIREMENT_TRIGGERS};
use crate::models::{EmploymentType, Opportunity, ScrapeFilters};
use crate::session::{ListingPlan, SourceSession};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use scraper::Html;

const BASE_URL: &str = "https://www.linkedin.com";
const CARD: &str = "div.base-search-card";
const DETAIL: &str = ".description__text";
const RESULTS_PER_PAGE: u32 = 25;

pub struct LinkedInAdapter {
    session: SourceSession,
}

impl LinkedInAdapter {
    pub fn new(config: &ScraperConfig) -> Self {
        Self::with_session(SourceId::LinkedIn.session(config))
    }

    pub fn with_session(session: SourceSession) -> Self {
        Self { session }
    }
}

pub fn search_url(filters: &ScrapeFilters, page: u32) -> String {
    let mut url = format!(
        "{}/jobs/search/?keywords={}",
        BASE_URL,
        encode(filters.keywords().unwrap_or("all"))
    );
    if let Some(location) = filters.location() {
        url.push_str(&format!("&location={}", encode(location)));
    }
    url.push_str(&format!("&start={}", page * RESULTS_PER_PAGE));
    url
}

/// Search cards as drafts; requirements are filled in from the detail page
pub fn parse_cards(html: &str, now: DateTime<Utc>) -> Vec<JobDraft> {
    let doc = Html::parse_document(html);
    fragments(&doc, CARD)
        .into_iter()
        .map(|card| {
            let workplace = first_text(card, &["span.workplace-type"]);
            JobDraft {
                title: first_text(card, &["h3.base-search-card__title"]),
                company: first_text(card, &["h4.base-search-card__subtitle"]),
                location: first_text(card, &["span.job-search-card__location"]),
                employment_type: first_text(card, &["span.job-search-card__employment-type"])
                    .map(|t| EmploymentType::from_text(&t)),
                description: first_text(card, &["p.base-search-card__metadata", "div.base-search-card__metadata"]),
                salary_range: first_text(card, &["span.job-search-card__salary-info"]),
                application_url: first_attr(card, &["a.base-card__full-link", "a.base-search-card__full-link"], "href")
                    .and_then(|href| resolve_url(BASE_URL, &href)),
                posted_date: Some(posted_date(
                    first_attr(card, &["time"], "datetime").as_deref(),
                    first_text(card, &["time.job-search-card__listdate", "time"]).as_deref(),
                    now,
                )),
                is_remote: workplace.map(|w| w.to_lowercase().contains("remote")).filter(|remote| *remote),
                ..Default::default()
            }
        })
        .collect()
}

/// Requirements section of a job's detail page
pub fn parse_requirements(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let description = fragments(&doc, DETAIL).into_iter().next().map(element_lines)?;
    section_lines(&description, REQUIREMENT_TRIGGERS, REQUIREMENT_STOPS)
}

#[async_trait]
impl SourceAdapter for LinkedInAdapter {
    fn id(&self) -> SourceId {
        SourceId::LinkedIn
    }

    fn session(&mut self) -> &mut SourceSession {
        &mut self.session
    }

    async fn scrape(&mut self, filters: &ScrapeFilters, num_pages: u32) -> Result<Vec<Opportunity>, ScrapeError> {
        let now = Utc::now();
        let mut records = Vec::new();

        for page_index in 0..num_pages {
            if page_index > 0 {
                self.session.pace().await;
            }
            let url = search_url(filters, page_index);
            let Some(page) = self.session.fetch_listing(&url, Some(CARD), ListingPlan::SCROLL).await else {
                continue;
            };

            let mut results = Vec::new();
            for mut draft in parse_cards(&page.content, now) {
                if draft.title.is_some() {
                    if let Some(detail_url) = draft.application_url.clone() {
                        if let Some(detail) = self.session.fetch_detail(&detail_url, Some(DETAIL)).await {
                            draft.requirements = parse_requirements(&detail.content);
                        }
                    }
                }
                results.push(draft.finish(self.name()));
            }

            let before = records.len();
            self.session.keep(results, &mut records);
            info!("[{}] Page {}: {} records", self.name(), page_index + 1, records.len() - before);
        }

        Ok(records)
    }
}
