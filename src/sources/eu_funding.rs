use super::{SourceAdapter, SourceId};
use crate::canonical::ScholarshipDraft;
use crate::config::ScraperConfig;
use crate::error::{RecordError, ScrapeError};
use crate::extract::dates::parse_deadline;
use crate::extract::urls::with_query;
use crate::models::{EducationLevel, Opportunity, Scholarship, ScrapeFilters};
use crate::session::SourceSession;
use async_trait::async_trait;
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;

const API_URL: &str = "https://api.tech.ec.europa.eu/funding/grants/grants";
const PAGE_SIZE: u32 = 25;

#[derive(Debug, Deserialize, Default)]
pub struct GrantsResponse {
    #[serde(default)]
    pub results: Vec<Grant>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Localized {
    #[serde(default)]
    pub en: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Grant {
    #[serde(default)]
    pub title: Localized,
    #[serde(default, rename = "fundingBody")]
    pub funding_body: Option<String>,
    #[serde(default)]
    pub description: Localized,
    #[serde(default, rename = "eligibilityCriteria")]
    pub eligibility_criteria: Localized,
    #[serde(default, rename = "fundingInformation")]
    pub funding_information: FundingInformation,
    #[serde(default)]
    pub topic: Topic,
    #[serde(default)]
    pub deadline: Deadline,
    #[serde(default, rename = "callUrl")]
    pub call_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FundingInformation {
    #[serde(default, rename = "maxAmount")]
    pub max_amount: Option<Value>,
    #[serde(default, rename = "fundingRate")]
    pub funding_rate: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Topic {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Localized,
}

#[derive(Debug, Deserialize, Default)]
pub struct Deadline {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// The EU Funding & Tenders grants API. Responses are JSON, so block
/// detection is off and any failed page ends the run for this source.
pub struct EuFundingAdapter {
    session: SourceSession,
}

impl EuFundingAdapter {
    pub fn new(config: &ScraperConfig) -> Self {
        Self::with_session(SourceId::EuFunding.session(config))
    }

    pub fn with_session(session: SourceSession) -> Self {
        Self {
            session: session.undefended(),
        }
    }
}

pub fn api_url(filters: &ScrapeFilters, page: u32) -> String {
    with_query(
        API_URL,
        &[
            ("page", Some((page + 1).to_string())),
            ("limit", Some(PAGE_SIZE.to_string())),
            ("orderBy", Some("publicationDate".to_string())),
            ("order", Some("desc".to_string())),
            ("language", Some("en".to_string())),
            ("responseType", Some("json".to_string())),
            ("topic", filters.field_of_study().map(str::to_string)),
            ("country", filters.country().map(str::to_string)),
        ],
    )
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn is_full_rate(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Number(n)) => n.as_f64() == Some(100.0),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().ok() == Some(100.0),
        _ => false,
    }
}

/// Only an explicit closed status retires a call; forthcoming or unknown ones stay active
fn is_closed(status: Option<&str>) -> bool {
    status.is_some_and(|s| s.trim().eq_ignore_ascii_case("CLOSED"))
}

impl Grant {
    pub fn into_draft(self, filters: &ScrapeFilters) -> ScholarshipDraft {
        let funding = self.funding_information;
        ScholarshipDraft {
            title: self.title.en,
            organization: self.funding_body.or_else(|| Some("European Commission".to_string())),
            description: self.description.en,
            requirements: self.eligibility_criteria.en,
            amount: funding
                .max_amount
                .as_ref()
                .and_then(value_text)
                .map(|max| format!("Maximum {} EUR", max)),
            country: Some("European Union".to_string()),
            education_level: Some(EducationLevel::from_research_text(self.topic.kind.as_deref().unwrap_or(""))),
            field_of_study: filters
                .field_of_study()
                .map(str::to_string)
                .or(self.topic.name.en),
            deadline: self.deadline.date.as_deref().and_then(parse_deadline),
            website_url: self.call_url,
            is_fully_funded: Some(is_full_rate(funding.funding_rate.as_ref())),
            is_active: Some(!is_closed(self.deadline.status.as_deref())),
        }
    }
}

pub fn parse_response(body: &str, filters: &ScrapeFilters) -> Result<Vec<Result<Scholarship, RecordError>>, ScrapeError> {
    let response: GrantsResponse = serde_json::from_str(body).map_err(|e| ScrapeError::Parse {
        what: "grants response".to_string(),
        reason: e.to_string(),
    })?;
    Ok(response
        .results
        .into_iter()
        .map(|grant| grant.into_draft(filters).finish(SourceId::EuFunding.display_name()))
        .collect())
}

#[async_trait]
impl SourceAdapter for EuFundingAdapter {
    fn id(&self) -> SourceId {
        SourceId::EuFunding
    }

    fn session(&mut self) -> &mut SourceSession {
        &mut self.session
    }

    async fn scrape(&mut self, filters: &ScrapeFilters, num_pages: u32) -> Result<Vec<Opportunity>, ScrapeError> {
        let mut records = Vec::new();

        for page_index in 0..num_pages {
            if page_index > 0 {
                self.session.pace().await;
            }
            let url = api_url(filters, page_index);
            let Some(page) = self.session.fetch_page(&url, None).await else {
                break;
            };
            if let Some(status) = page.status.filter(|s| !(200..300).contains(s)) {
                warn!("[{}] API returned {} for page {}, stopping", self.name(), status, page_index + 1);
                break;
            }
            let results = match parse_response(&page.content, filters) {
                Ok(results) => results,
                Err(e) => {
                    warn!("[{}] {}, stopping", self.name(), e);
                    break;
                }
            };

            let before = records.len();
            self.session.keep(results, &mut records);
            info!("[{}] Page {}: {} records", self.name(), page_index + 1, records.len() - before);
        }

        Ok(records)
    }
}
