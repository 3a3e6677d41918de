//! Shared parser for scholarship directories that render one card per award.
//!
//! Sites differ only in class names, so each adapter supplies a `CardLayout`
//! and post-processes the drafts with its own rules.

use crate::canonical::ScholarshipDraft;
use crate::extract::dates::parse_deadline;
use crate::extract::html::{element_text, first, first_attr, first_text, fragments, list_text, own_or_parent_href};
use crate::extract::urls::resolve_url;
use crate::extract::{mentions_any, FULLY_FUNDED_PHRASES};
use crate::models::{EducationLevel, ScrapeFilters};
use scraper::Html;

/// Candidate selectors for every field of a scholarship card.
/// Each list is tried in order; empty lists leave the field unset.
#[derive(Debug, Clone, Copy)]
pub struct CardLayout {
    pub card: &'static str,
    pub title: &'static [&'static str],
    pub organization: &'static [&'static str],
    pub description: &'static [&'static str],
    pub requirements: &'static [&'static str],
    pub amount: &'static [&'static str],
    pub country: &'static [&'static str],
    pub level: &'static [&'static str],
    pub field: &'static [&'static str],
    pub deadline: &'static [&'static str],
    pub link: &'static [&'static str],
}

/// A draft plus the card's full text, for heuristics that look at everything
#[derive(Debug, Clone)]
pub struct ParsedCard {
    pub draft: ScholarshipDraft,
    pub text: String,
}

pub fn parse_cards(html: &str, base_url: &str, layout: &CardLayout) -> Vec<ParsedCard> {
    let doc = Html::parse_document(html);
    fragments(&doc, layout.card)
        .into_iter()
        .map(|card| {
            let website_url = first_attr(card, layout.link, "href")
                .or_else(|| first(card, layout.title).and_then(own_or_parent_href))
                .and_then(|href| resolve_url(base_url, &href));

            let draft = ScholarshipDraft {
                title: first_text(card, layout.title),
                organization: first_text(card, layout.organization),
                description: first_text(card, layout.description),
                requirements: list_text(card, layout.requirements, "li, p"),
                amount: first_text(card, layout.amount),
                country: first_text(card, layout.country),
                education_level: first_text(card, layout.level).map(|t| EducationLevel::from_text(&t)),
                field_of_study: first_text(card, layout.field),
                deadline: first_text(card, layout.deadline).and_then(|t| parse_deadline(&t)),
                website_url,
                ..Default::default()
            };
            ParsedCard {
                draft,
                text: element_text(card),
            }
        })
        .collect()
}

impl ScholarshipDraft {
    /// Filter values win over whatever the card said
    pub fn apply_filters(mut self, filters: &ScrapeFilters) -> Self {
        if let Some(country) = filters.country() {
            self.country = Some(country.to_string());
        }
        if let Some(field) = filters.field_of_study() {
            self.field_of_study = Some(field.to_string());
        }
        self
    }
}

/// Fully funded when any funding phrase occurs in the amount or the card text
pub fn fully_funded(amount: Option<&str>, text: &str) -> bool {
    amount.map_or(false, |a| mentions_any(a, FULLY_FUNDED_PHRASES)) || mentions_any(text, FULLY_FUNDED_PHRASES)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: CardLayout = CardLayout {
        card: "div.item",
        title: &["h3.title", "h2"],
        organization: &[".org"],
        description: &[".desc"],
        requirements: &[".reqs"],
        amount: &[".amount"],
        country: &[".country"],
        level: &[".level"],
        field: &[],
        deadline: &[".deadline"],
        link: &["a.apply"],
    };

    const PAGE: &str = r#"
        <div class="item">
          <h3 class="title">Global Scholars Award</h3>
          <div class="org">Acme Foundation</div>
          <div class="desc">For ambitious students.</div>
          <ul class="reqs"><li>GPA 3.5</li><li>Essay</li></ul>
          <div class="amount">Full tuition</div>
          <div class="country">Canada</div>
          <div class="level">Master's degree</div>
          <div class="deadline">Deadline: March 15, 2025</div>
          <a class="apply" href="/awards/1">Apply</a>
        </div>
        <div class="item">
          <a href="https://other.org/a"><h2>Linked heading</h2></a>
        </div>
        <div class="item"><p>No title here</p></div>"#;

    #[test]
    fn test_parse_cards_fields() {
        let cards = parse_cards(PAGE, "https://example.edu", &LAYOUT);
        assert_eq!(cards.len(), 3);

        let first = &cards[0].draft;
        assert_eq!(first.title.as_deref(), Some("Global Scholars Award"));
        assert_eq!(first.requirements.as_deref(), Some("GPA 3.5\nEssay"));
        assert_eq!(first.education_level, Some(EducationLevel::Masters));
        assert_eq!(first.deadline, chrono::NaiveDate::from_ymd_opt(2025, 3, 15));
        assert_eq!(first.website_url.as_deref(), Some("https://example.edu/awards/1"));
        assert!(fully_funded(first.amount.as_deref(), &cards[0].text));

        assert_eq!(cards[1].draft.website_url.as_deref(), Some("https://other.org/a"));
        assert!(cards[2].draft.title.is_none());
    }

    #[test]
    fn test_filters_override() {
        let filters = ScrapeFilters {
            country: Some("Germany".to_string()),
            ..Default::default()
        };
        let cards = parse_cards(PAGE, "https://example.edu", &LAYOUT);
        let draft = cards[0].draft.clone().apply_filters(&filters);
        assert_eq!(draft.country.as_deref(), Some("Germany"));
        assert_eq!(draft.field_of_study, None);
    }
}
