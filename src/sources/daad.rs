use super::{SourceAdapter, SourceId};
use crate::canonical::ScholarshipDraft;
use crate::config::ScraperConfig;
use crate::error::{RecordError, ScrapeError};
use crate::extract::html::{classed, element_text, first, first_loosely_classed, own_or_parent_href};
use crate::extract::urls::resolve_url;
use crate::models::{Opportunity, Scholarship, ScrapeFilters};
use crate::session::{ListingPlan, SourceSession};
use async_trait::async_trait;
use scraper::{ElementRef, Html};
use std::collections::HashSet;

const BASE_URL: &str = "https://www2.daad.de";
const DATABASE_URL: &str = "https://www2.daad.de/deutschland/stipendium/datenbank/en/21148-scholarship-database/";
const CONTAINER_KEYWORDS: &[&str] = &["scholarship", "result", "listing", "program"];

/// The DAAD scholarship database. Its markup has no stable class names, so
/// entries are found by the words their classes contain.
pub struct DaadAdapter {
    session: SourceSession,
}

impl DaadAdapter {
    pub fn new(config: &ScraperConfig) -> Self {
        Self::with_session(SourceId::Daad.session(config))
    }

    pub fn with_session(session: SourceSession) -> Self {
        Self { session }
    }
}

fn entry_title(item: ElementRef) -> Option<ElementRef> {
    first_loosely_classed(item, &["h1", "h2", "h3", "h4"], &["title"])
        .or_else(|| first_loosely_classed(item, &["a"], &["title"]))
}

fn entry_url(item: ElementRef, title: ElementRef) -> Option<String> {
    own_or_parent_href(title)
        .or_else(|| first(item, &["a[href]"]).and_then(|a| a.value().attr("href").map(str::to_string)))
        .and_then(|href| resolve_url(BASE_URL, &href))
}

pub fn parse_listing(html: &str, filters: &ScrapeFilters) -> Vec<Result<Scholarship, RecordError>> {
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();

    classed(doc.root_element(), &["div", "article"], CONTAINER_KEYWORDS)
        .into_iter()
        .filter_map(|item| {
            let title = entry_title(item)?;
            let draft = ScholarshipDraft {
                title: Some(element_text(title)),
                organization: Some("DAAD".to_string()),
                description: first_loosely_classed(item, &["div", "p"], &["desc", "content", "text"])
                    .map(element_text),
                amount: Some("See website for details".to_string()),
                country: Some("Germany".to_string()),
                field_of_study: filters.field_of_study().map(str::to_string),
                website_url: entry_url(item, title),
                is_fully_funded: Some(false),
                ..Default::default()
            };
            // Nested containers yield the same entry more than once
            seen.insert((draft.title.clone(), draft.website_url.clone()))
                .then(|| draft.finish(SourceId::Daad.display_name()))
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for DaadAdapter {
    fn id(&self) -> SourceId {
        SourceId::Daad
    }

    fn session(&mut self) -> &mut SourceSession {
        &mut self.session
    }

    async fn scrape(&mut self, filters: &ScrapeFilters, num_pages: u32) -> Result<Vec<Opportunity>, ScrapeError> {
        Ok(self
            .session
            .collect_pages(
                num_pages.min(1),
                None,
                ListingPlan::PLAIN,
                |_| DATABASE_URL.to_string(),
                |page| parse_listing(&page.content, filters),
            )
            .await)
    }
}
