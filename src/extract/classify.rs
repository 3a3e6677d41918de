use crate::models::{EducationLevel, EmploymentType};

/// First-match substring classification over lower-cased input.
/// `table` is ordered; the first entry whose needle occurs wins.
pub fn classify<T: Copy>(text: &str, table: &[(&str, T)], default: T) -> T {
    let lower = text.to_lowercase();
    table
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, value)| *value)
        .unwrap_or(default)
}

/// True when `needle` occurs in `haystack` with no letter or digit on either side
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Like [`classify`], but needles must stand as whole words
pub fn classify_words<T: Copy>(text: &str, table: &[(&str, T)], default: T) -> T {
    let lower = text.to_lowercase();
    table
        .iter()
        .find(|(needle, _)| contains_word(&lower, needle))
        .map(|(_, value)| *value)
        .unwrap_or(default)
}

// Matched as whole words: "intern" must not fire inside "international"
const EMPLOYMENT_TABLE: &[(&str, EmploymentType)] = &[
    ("full-time", EmploymentType::FullTime),
    ("full time", EmploymentType::FullTime),
    ("part-time", EmploymentType::PartTime),
    ("part time", EmploymentType::PartTime),
    ("contract", EmploymentType::Contract),
    ("contractor", EmploymentType::Contract),
    ("freelance", EmploymentType::Contract),
    ("freelancer", EmploymentType::Contract),
    ("temporary", EmploymentType::Contract),
    ("internship", EmploymentType::Internship),
    ("internships", EmploymentType::Internship),
    ("intern", EmploymentType::Internship),
    ("interns", EmploymentType::Internship),
    ("remote", EmploymentType::Remote),
];

// Postdoc is tested before doctorate and undergraduate before graduate,
// otherwise "post-doctorate" and "undergraduate" land in the wrong bucket.
const EDUCATION_TABLE: &[(&str, EducationLevel)] = &[
    ("postdoc", EducationLevel::Postdoc),
    ("post-doc", EducationLevel::Postdoc),
    ("phd", EducationLevel::Phd),
    ("ph.d", EducationLevel::Phd),
    ("doctorate", EducationLevel::Phd),
    ("doctoral", EducationLevel::Phd),
    ("undergraduate", EducationLevel::Undergraduate),
    ("bachelor", EducationLevel::Undergraduate),
    ("master", EducationLevel::Masters),
    ("graduate", EducationLevel::Masters),
];

const RESEARCH_TABLE: &[(&str, EducationLevel)] = &[
    ("postdoc", EducationLevel::Postdoc),
    ("post-doc", EducationLevel::Postdoc),
    ("early stage researcher", EducationLevel::Phd),
    ("phd candidate", EducationLevel::Phd),
    ("doctoral", EducationLevel::Phd),
];

impl EmploymentType {
    /// Collapse free text such as "Full-time, Permanent" to the closed set
    pub fn from_text(text: &str) -> Self {
        classify_words(text, EMPLOYMENT_TABLE, EmploymentType::FullTime)
    }
}

impl EducationLevel {
    pub fn from_text(text: &str) -> Self {
        classify(text, EDUCATION_TABLE, EducationLevel::All)
    }

    /// Researcher career-stage wording used by research funding calls
    pub fn from_research_text(text: &str) -> Self {
        classify(text, RESEARCH_TABLE, EducationLevel::All)
    }
}
