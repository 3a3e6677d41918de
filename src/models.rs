use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const UNKNOWN_ORGANIZATION: &str = "Unknown Organization";
pub const NO_DESCRIPTION: &str = "No description available";
pub const NO_REQUIREMENTS: &str = "No specific requirements listed";
pub const LOCATION_NOT_SPECIFIED: &str = "Not specified";
pub const SALARY_NOT_SPECIFIED: &str = "Not specified";
pub const AMOUNT_NOT_SPECIFIED: &str = "Amount not specified";
pub const INTERNATIONAL: &str = "International";
pub const ALL_FIELDS: &str = "All Fields";

/// Longest description kept on a record, in characters
pub const DESCRIPTION_LIMIT: usize = 500;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OpportunityKind {
    Job,
    Scholarship,
}

impl fmt::Display for OpportunityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpportunityKind::Job => write!(f, "job"),
            OpportunityKind::Scholarship => write!(f, "scholarship"),
        }
    }
}

impl std::str::FromStr for OpportunityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "job" | "jobs" => Ok(OpportunityKind::Job),
            "scholarship" | "scholarships" => Ok(OpportunityKind::Scholarship),
            other => Err(format!("unknown opportunity kind: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentType {
    #[default]
    FullTime,
    PartTime,
    Contract,
    Internship,
    Remote,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EducationLevel {
    Undergraduate,
    Masters,
    Phd,
    Postdoc,
    #[default]
    All,
}

/// Optional narrowing applied by adapters when building listing URLs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeFilters {
    pub keywords: Option<String>,
    pub location: Option<String>,
    pub field_of_study: Option<String>,
    pub country: Option<String>,
}

impl ScrapeFilters {
    pub fn keywords(&self) -> Option<&str> {
        non_blank(&self.keywords)
    }

    pub fn location(&self) -> Option<&str> {
        non_blank(&self.location)
    }

    pub fn field_of_study(&self) -> Option<&str> {
        non_blank(&self.field_of_study)
    }

    pub fn country(&self) -> Option<&str> {
        non_blank(&self.country)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// A job posting, built only through `JobDraft::finish`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JobListing {
    pub title: String,
    pub company: String,
    pub location: String,
    pub employment_type: EmploymentType,
    pub description: String,
    pub requirements: String,
    pub salary_range: String,
    pub application_url: String,
    pub source_website: String,
    pub posted_date: DateTime<Utc>,
    pub deadline: Option<NaiveDate>,
    pub is_remote: bool,
    pub is_active: bool,
}

/// A scholarship posting, built only through `ScholarshipDraft::finish`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Scholarship {
    pub title: String,
    pub organization: String,
    pub description: String,
    pub requirements: String,
    pub amount: String,
    pub country: String,
    pub education_level: EducationLevel,
    pub field_of_study: String,
    pub deadline: Option<NaiveDate>,
    pub website_url: String,
    pub source_website: String,
    pub is_fully_funded: bool,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Opportunity {
    Job(JobListing),
    Scholarship(Scholarship),
}

impl Opportunity {
    pub fn kind(&self) -> OpportunityKind {
        match self {
            Opportunity::Job(_) => OpportunityKind::Job,
            Opportunity::Scholarship(_) => OpportunityKind::Scholarship,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Opportunity::Job(j) => &j.title,
            Opportunity::Scholarship(s) => &s.title,
        }
    }

    /// Company for jobs, awarding organization for scholarships
    pub fn organization(&self) -> &str {
        match self {
            Opportunity::Job(j) => &j.company,
            Opportunity::Scholarship(s) => &s.organization,
        }
    }

    pub fn source_website(&self) -> &str {
        match self {
            Opportunity::Job(j) => &j.source_website,
            Opportunity::Scholarship(s) => &s.source_website,
        }
    }

    /// Application URL for jobs, website URL for scholarships
    pub fn url(&self) -> &str {
        match self {
            Opportunity::Job(j) => &j.application_url,
            Opportunity::Scholarship(s) => &s.website_url,
        }
    }

    pub fn as_job(&self) -> Option<&JobListing> {
        match self {
            Opportunity::Job(j) => Some(j),
            _ => None,
        }
    }

    pub fn as_scholarship(&self) -> Option<&Scholarship> {
        match self {
            Opportunity::Scholarship(s) => Some(s),
            _ => None,
        }
    }
}

impl From<JobListing> for Opportunity {
    fn from(job: JobListing) -> Self {
        Opportunity::Job(job)
    }
}

impl From<Scholarship> for Opportunity {
    fn from(scholarship: Scholarship) -> Self {
        Opportunity::Scholarship(scholarship)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&EmploymentType::FullTime).unwrap(), "\"FULL_TIME\"");
        assert_eq!(serde_json::to_string(&EmploymentType::PartTime).unwrap(), "\"PART_TIME\"");
        assert_eq!(serde_json::to_string(&EducationLevel::Phd).unwrap(), "\"PHD\"");
        assert_eq!(serde_json::to_string(&EducationLevel::All).unwrap(), "\"ALL\"");
    }

    #[test]
    fn test_enum_defaults() {
        assert_eq!(EmploymentType::default(), EmploymentType::FullTime);
        assert_eq!(EducationLevel::default(), EducationLevel::All);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("jobs".parse::<OpportunityKind>(), Ok(OpportunityKind::Job));
        assert_eq!(" Scholarship ".parse::<OpportunityKind>(), Ok(OpportunityKind::Scholarship));
        assert!("grants".parse::<OpportunityKind>().is_err());
    }

    #[test]
    fn test_blank_filters_are_ignored() {
        let filters = ScrapeFilters {
            keywords: Some("  ".to_string()),
            country: Some(" Germany ".to_string()),
            ..Default::default()
        };
        assert_eq!(filters.keywords(), None);
        assert_eq!(filters.country(), Some("Germany"));
        assert_eq!(filters.location(), None);
    }
}
