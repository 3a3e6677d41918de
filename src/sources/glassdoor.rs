use super::{SourceAdapter, SourceId};
use crate::canonical::JobDraft;
use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::extract::dates::resolve_relative;
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

const BASE_URL: &str = "https://www.glassdoor.com";
const CARD: &str = "li.jobCard";
const DETAIL: &str = ".jobDescriptionContent";

pub struct GlassdoorAdapter {
    session: SourceSession,
}

impl GlassdoorAdapter {
    pub fn new(config: &ScraperConfig) -> Self {
        Self::with_session(SourceId::Glassdoor.session(config))
    }

    pub fn with_session(session: SourceSession) -> Self {
        Self { session }
    }
}

pub fn search_url(filters: &ScrapeFilters, page: u32) -> String {
    let mut url = format!(
        "{}/Job/jobs.htm?sc.keyword={}&locT=C&locId=1",
        BASE_URL,
        encode(filters.keywords().unwrap_or("all"))
    );
    if page > 0 {
        url.push_str(&format!("&p={}", page + 1));
    }
    url
}

/// Job age is shown without "ago" ("3 days", "1 week")
fn job_age(text: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    if text.to_lowercase().contains("ago") {
        resolve_relative(text, now)
    } else {
        resolve_relative(&format!("{} ago", text), now)
    }
}

pub fn parse_cards(html: &str, now: DateTime<Utc>) -> Vec<JobDraft> {
    let doc = Html::parse_document(html);
    fragments(&doc, CARD)
        .into_iter()
        .map(|card| {
            let location = first_text(card, &["span[data-test=location]", "div[data-test=emp-location]"]);
            JobDraft {
                title: first_text(card, &["a[data-test=job-link]", "a[data-test=job-title]"]),
                company: first_text(card, &["div[data-test=employer-name]", "span[data-test=employer-name]"]),
                is_remote: location.as_deref().map(|l| l.to_lowercase().contains("remote")),
                location,
                employment_type: first_text(card, &["span[data-test=job-type]"])
                    .map(|t| EmploymentType::from_text(&t)),
                salary_range: first_text(card, &["span[data-test=detailSalary]"]),
                application_url: first_attr(card, &["a[data-test=job-link]", "a[data-test=job-title]"], "href")
                    .and_then(|href| resolve_url(BASE_URL, &href)),
                posted_date: first_text(card, &["div[data-test=job-age]"]).map(|t| job_age(&t, now)),
                ..Default::default()
            }
        })
        .collect()
}

/// Full description and its requirements section from a job's detail page
pub fn parse_detail(html: &str) -> (Option<String>, Option<String>) {
    let doc = Html::parse_document(html);
    let Some(description) = fragments(&doc, DETAIL).into_iter().next().map(element_lines) else {
        return (None, None);
    };
    let requirements = section_lines(&description, REQUIREMENT_TRIGGERS, REQUIREMENT_STOPS);
    (Some(description), requirements)
}

#[async_trait]
impl SourceAdapter for GlassdoorAdapter {
    fn id(&self) -> SourceId {
        SourceId::Glassdoor
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
                            (draft.description, draft.requirements) = parse_detail(&detail.content);
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const FIXTURE: &str = r#"
    <ul>
      <li class="jobCard">
        <a data-test="job-link" href="/job-listing/staff-engineer-JV_123.htm">Staff Engineer</a>
        <div data-test="employer-name">Cloudflare</div>
        <span data-test="location">Remote</span>
        <span data-test="detailSalary">$200K - $250K (Employer est.)</span>
        <span data-test="job-type">Contract</span>
        <div data-test="job-age">2 days</div>
      </li>
      <li class="jobCard">
        <div data-test="employer-name">Nobody</div>
      </li>
    </ul>"#;

    const DETAIL_PAGE: &str = r#"
    <div class="jobDescriptionContent">
      <p>Join the edge team.</p>
      <p>Qualifications</p>
      <ul><li>Go or Rust</li></ul>
      <p>What we offer</p>
    </div>"#;

    #[test]
    fn test_search_url_pagination() {
        let filters = ScrapeFilters {
            keywords: Some("rust".to_string()),
            ..Default::default()
        };
        assert_eq!(
            search_url(&filters, 0),
            "https://www.glassdoor.com/Job/jobs.htm?sc.keyword=rust&locT=C&locId=1"
        );
        assert_eq!(
            search_url(&filters, 2),
            "https://www.glassdoor.com/Job/jobs.htm?sc.keyword=rust&locT=C&locId=1&p=3"
        );
    }

    #[test]
    fn test_parse_cards() {
        let now = Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap();
        let drafts = parse_cards(FIXTURE, now);
        assert_eq!(drafts.len(), 2);

        let job = drafts[0].clone().finish("Glassdoor").unwrap();
        assert_eq!(job.title, "Staff Engineer");
        assert_eq!(job.company, "Cloudflare");
        assert_eq!(job.employment_type, EmploymentType::Contract);
        assert_eq!(job.application_url, "https://www.glassdoor.com/job-listing/staff-engineer-JV_123.htm");
        assert_eq!(job.posted_date, now - Duration::days(2));
        assert!(job.is_remote);

        assert!(drafts[1].clone().finish("Glassdoor").is_err());
    }

    #[test]
    fn test_parse_detail() {
        let (description, requirements) = parse_detail(DETAIL_PAGE);
        assert!(description.unwrap().starts_with("Join the edge team."));
        assert_eq!(requirements.as_deref(), Some("Qualifications\nGo or Rust"));
        assert_eq!(parse_detail("<p>blocked</p>"), (None, None));
    }
}
