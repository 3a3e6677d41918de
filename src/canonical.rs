//! Drafts collect whatever a fragment yielded; `finish` applies the record policy:
//! drop when title, source or URL is missing, substitute sentinels otherwise.

use crate::error::RecordError;
use crate::extract::text::{clean_lines, non_empty, truncate_description};
use crate::extract::{mentions_any, REMOTE_PHRASES};
use crate::models::*;
use chrono::{DateTime, NaiveDate, Utc};
use url::Url;

#[derive(Debug, Default, Clone)]
pub struct JobDraft {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub salary_range: Option<String>,
    pub application_url: Option<String>,
    pub posted_date: Option<DateTime<Utc>>,
    pub deadline: Option<NaiveDate>,
    pub is_remote: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Clone)]
pub struct ScholarshipDraft {
    pub title: Option<String>,
    pub organization: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub amount: Option<String>,
    pub country: Option<String>,
    pub education_level: Option<EducationLevel>,
    pub field_of_study: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub website_url: Option<String>,
    pub is_fully_funded: Option<bool>,
    pub is_active: Option<bool>,
}

fn required(value: Option<&str>, field: &'static str) -> Result<String, RecordError> {
    value.and_then(non_empty).ok_or(RecordError::MissingField(field))
}

fn absolute_url(value: Option<&str>, field: &'static str) -> Result<String, RecordError> {
    let raw = required(value, field)?;
    match Url::parse(&raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(raw),
        _ => Err(RecordError::MissingField(field)),
    }
}

fn or_sentinel(value: Option<&str>, sentinel: &str) -> String {
    value.and_then(non_empty).unwrap_or_else(|| sentinel.to_string())
}

fn multiline_or_sentinel(value: Option<&str>, sentinel: &str) -> String {
    let cleaned = value.map(clean_lines).unwrap_or_default();
    if cleaned.is_empty() {
        sentinel.to_string()
    } else {
        cleaned
    }
}

fn description_or_sentinel(value: Option<&str>) -> String {
    let truncated = value
        .map(|d| truncate_description(d, DESCRIPTION_LIMIT))
        .unwrap_or_default();
    if truncated.is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        truncated
    }
}

impl JobDraft {
    pub fn finish(self, source_website: &str) -> Result<JobListing, RecordError> {
        let title = required(self.title.as_deref(), "title")?;
        let source_website = required(Some(source_website), "source_website")?;
        let application_url = absolute_url(self.application_url.as_deref(), "application_url")?;

        let location = or_sentinel(self.location.as_deref(), LOCATION_NOT_SPECIFIED);
        let employment_type = self.employment_type.unwrap_or_default();
        let is_remote = self.is_remote.unwrap_or_else(|| {
            employment_type == EmploymentType::Remote
                || mentions_any(&format!("{} {}", title, location), REMOTE_PHRASES)
        });

        Ok(JobListing {
            title,
            company: or_sentinel(self.company.as_deref(), UNKNOWN_COMPANY),
            location,
            employment_type,
            description: description_or_sentinel(self.description.as_deref()),
            requirements: multiline_or_sentinel(self.requirements.as_deref(), NO_REQUIREMENTS),
            salary_range: or_sentinel(self.salary_range.as_deref(), SALARY_NOT_SPECIFIED),
            application_url,
            source_website,
            posted_date: self.posted_date.unwrap_or_else(Utc::now),
            deadline: self.deadline,
            is_remote,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

impl ScholarshipDraft {
    pub fn finish(self, source_website: &str) -> Result<Scholarship, RecordError> {
        let title = required(self.title.as_deref(), "title")?;
        let source_website = required(Some(source_website), "source_website")?;
        let website_url = absolute_url(self.website_url.as_deref(), "website_url")?;

        Ok(Scholarship {
            title,
            organization: or_sentinel(self.organization.as_deref(), UNKNOWN_ORGANIZATION),
            description: description_or_sentinel(self.description.as_deref()),
            requirements: multiline_or_sentinel(self.requirements.as_deref(), NO_REQUIREMENTS),
            amount: multiline_or_sentinel(self.amount.as_deref(), AMOUNT_NOT_SPECIFIED),
            country: or_sentinel(self.country.as_deref(), INTERNATIONAL),
            education_level: self.education_level.unwrap_or_default(),
            field_of_study: or_sentinel(self.field_of_study.as_deref(), ALL_FIELDS),
            deadline: self.deadline,
            website_url,
            source_website,
            is_fully_funded: self.is_fully_funded.unwrap_or(false),
            is_active: self.is_active.unwrap_or(true),
        })
    }
}
