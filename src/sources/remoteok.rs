use super::{SourceAdapter, SourceId};
use crate::canonical::JobDraft;
use crate::config::ScraperConfig;
use crate::error::{RecordError, ScrapeError};
use crate::extract::dates::posted_date;
use crate::extract::html::{element_lines, element_text, first, first_attr, first_text, fragments, selector};
use crate::extract::text::section_lines;
use crate::extract::urls::{resolve_url, slug};
use crate::extract::{REQUIREMENT_STOPS, REQUIREMENT_TRIGGERS};
use crate::models::{EmploymentType, JobListing, Opportunity, ScrapeFilters};
use crate::session::{ListingPlan, SourceSession};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html};

const BASE_URL: &str = "https://remoteok.com";
const ROW: &str = "tr.job";

/// RemoteOK lists every match on one page, so only page 0 is ever fetched
pub struct RemoteOkAdapter {
    session: SourceSession,
}

impl RemoteOkAdapter {
    pub fn new(config: &ScraperConfig) -> Self {
        Self::with_session(SourceId::RemoteOk.session(config))
    }

    pub fn with_session(session: SourceSession) -> Self {
        Self { session }
    }
}

pub fn search_url(filters: &ScrapeFilters) -> String {
    let keywords = filters.keywords().map(slug).filter(|s| !s.is_empty());
    format!("{}/remote-{}-jobs", BASE_URL, keywords.as_deref().unwrap_or("all"))
}

/// Tags are written without spaces ("fulltime"); spell them out before classifying
fn employment_from_tags(row: ElementRef) -> Option<EmploymentType> {
    let sel = selector("td.tags")?;
    let tags: Vec<String> = row.select(&sel).map(element_text).collect();
    if tags.is_empty() {
        return None;
    }
    let text = tags
        .join(" ")
        .to_lowercase()
        .replace("fulltime", "full time")
        .replace("parttime", "part time");
    // Every RemoteOK job is remote, so the tag says nothing about the type
    let kind = EmploymentType::from_text(&text.replace("remote", ""));
    Some(kind)
}

/// The first location badge that carries a dollar amount
fn salary(row: ElementRef) -> Option<String> {
    let sel = selector("div.location")?;
    row.select(&sel)
        .map(element_text)
        .find(|text| text.contains('$'))
}

/// The `tr.expand` row rendered straight after a job row, holding its description
fn expand_row(row: ElementRef) -> Option<ElementRef> {
    row.next_siblings()
        .filter_map(ElementRef::wrap)
        .next()
        .filter(|next| next.value().name() == "tr" && next.value().classes().any(|c| c == "expand"))
}

fn row_url(row: ElementRef) -> Option<String> {
    first_attr(row, &["a.preventLink", "a[itemprop=url]", "a.job"], "href")
        .or_else(|| row.value().attr("data-url").map(str::to_string))
        .and_then(|href| resolve_url(BASE_URL, &href))
}

pub fn parse_listing(html: &str, now: DateTime<Utc>) -> Vec<Result<JobListing, RecordError>> {
    let doc = Html::parse_document(html);
    fragments(&doc, ROW)
        .into_iter()
        .map(|row| {
            let description = first(row, &["div.description"])
                .or_else(|| expand_row(row).and_then(|expand| first(expand, &["div.description"])))
                .map(element_lines);
            JobDraft {
                title: first_text(row, &["h2[itemprop=title]", "h2"]),
                company: first_text(row, &["h3[itemprop=name]", "h3"]),
                location: Some("Remote".to_string()),
                employment_type: employment_from_tags(row),
                requirements: description
                    .as_deref()
                    .and_then(|d| section_lines(d, REQUIREMENT_TRIGGERS, REQUIREMENT_STOPS)),
                description,
                salary_range: salary(row),
                application_url: row_url(row),
                posted_date: Some(posted_date(
                    first_attr(row, &["time[datetime]"], "datetime").as_deref(),
                    None,
                    now,
                )),
                is_remote: Some(true),
                ..Default::default()
            }
            .finish(SourceId::RemoteOk.display_name())
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for RemoteOkAdapter {
    fn id(&self) -> SourceId {
        SourceId::RemoteOk
    }

    fn session(&mut self) -> &mut SourceSession {
        &mut self.session
    }

    async fn scrape(&mut self, filters: &ScrapeFilters, num_pages: u32) -> Result<Vec<Opportunity>, ScrapeError> {
        let now = Utc::now();
        let url = search_url(filters);
        Ok(self
            .session
            .collect_pages(
                num_pages.min(1),
                Some(ROW),
                ListingPlan::SCROLL,
                |_| url.clone(),
                |page| parse_listing(&page.content, now),
            )
            .await)
    }
}
