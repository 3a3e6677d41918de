//! Field extractors: pure functions from page fragments or text to canonical values.
//!
//! Nothing in here returns an error. Every extractor yields a value or `None`
//! and the caller substitutes the documented sentinel.

pub mod classify;
pub mod dates;
pub mod html;
pub mod text;
pub mod urls;

pub use classify::{classify, classify_words, contains_word};
pub use dates::{parse_deadline, posted_date, resolve_relative};
pub use html::{
    classed, element_lines, element_text, first, first_attr, first_loosely_classed, first_text, fragments, list_text,
    visible_text,
};
pub use text::{
    amount_from_text, clean_text, mentions_any, phrase_after, section_after_keyword, section_lines,
    truncate_description,
};
pub use urls::{encode, resolve_url, slug, with_query};

/// Phrases that mark a scholarship as covering full costs
pub const FULLY_FUNDED_PHRASES: &[&str] = &[
    "full scholarship",
    "fully funded",
    "full funding",
    "complete funding",
    "full tuition",
    "full ride",
    "100% coverage",
];

/// Phrases that mark a job as remote
pub const REMOTE_PHRASES: &[&str] = &["remote", "work from home", "wfh", "anywhere"];

/// Lower-case header lines that open a requirements section in a job description
pub const REQUIREMENT_TRIGGERS: &[&str] = &["required", "requirements", "qualifications"];

/// Lower-case header lines that close a requirements section
pub const REQUIREMENT_STOPS: &[&str] = &["about us", "benefits", "what we offer"];
