//! Free-text heuristics shared by every source.

use regex::Regex;
use std::sync::LazyLock;

/// A sentence terminator followed by whitespace or the end, or a line break
static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?](\s|$)|\n").unwrap());

/// Collapse runs of whitespace (including newlines) into single spaces
pub fn clean_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cleaned text, or None when nothing but whitespace remains
pub fn non_empty(s: &str) -> Option<String> {
    let cleaned = clean_text(s);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Trim every line and drop the empty ones, keeping line structure
pub fn clean_lines(s: &str) -> String {
    s.lines()
        .map(clean_text)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse whitespace and cut to `max_chars` characters, appending "..." when cut
pub fn truncate_description(text: &str, max_chars: usize) -> String {
    let cleaned = clean_text(text);
    if cleaned.chars().count() <= max_chars {
        return cleaned;
    }
    let cut: String = cleaned.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

/// True when any phrase occurs anywhere in `text`, ignoring case
pub fn mentions_any(text: &str, phrases: &[&str]) -> bool {
    let lower = text.to_lowercase();
    phrases.iter().any(|p| lower.contains(&p.to_lowercase()))
}

/// Byte offset of the first ASCII case-insensitive occurrence of `needle`
fn find_ignore_case(text: &str, needle: &str) -> Option<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .find(|&i| text.get(i..i + needle.len()).is_some_and(|s| s.eq_ignore_ascii_case(needle)))
}

/// Byte span of the earliest case-insensitive match of any needle
fn find_earliest(text: &str, needles: &[&str]) -> Option<(usize, usize)> {
    needles
        .iter()
        .filter(|n| !n.trim().is_empty())
        .filter_map(|n| find_ignore_case(text, n).map(|start| (start, start + n.len())))
        .min_by_key(|(start, _)| *start)
}

/// Keyword-bounded section extraction.
///
/// Finds the first occurrence of any `keywords` entry and captures what follows it,
/// up to the next sentence terminator, line break, or `stops` keyword. Returns None
/// when no keyword occurs or the capture is empty.
pub fn section_after_keyword(text: &str, keywords: &[&str], stops: &[&str]) -> Option<String> {
    let (_, start) = find_earliest(text, keywords)?;
    let rest = &text[start..];

    let mut end = SENTENCE_END.find(rest).map_or(rest.len(), |m| m.start());
    if let Some((stop, _)) = find_earliest(rest, stops) {
        end = end.min(stop);
    }

    let captured = rest[..end].trim_start_matches(|c: char| c == ':' || c == '-' || c.is_whitespace());
    non_empty(captured.trim_end_matches(|c: char| c == ',' || c == ';' || c.is_whitespace()))
}

/// Multi-line variant used on long job descriptions.
///
/// Starts capturing at the first line containing a trigger and stops at the first
/// later line containing a stop keyword.
pub fn section_lines(text: &str, triggers: &[&str], stops: &[&str]) -> Option<String> {
    let mut capturing = false;
    let mut captured = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();
        if !capturing {
            if triggers.iter().any(|t| lower.contains(t)) {
                capturing = true;
                captured.push(line.to_string());
            }
            continue;
        }
        if stops.iter().any(|s| lower.contains(s)) {
            break;
        }
        captured.push(line.to_string());
    }

    if captured.is_empty() {
        None
    } else {
        Some(captured.join("\n"))
    }
}

/// The phrase that follows one of `markers`, up to `terminator`.
/// "Offered by the Gates Foundation. Apply now" with marker "offered by" yields
/// "the Gates Foundation".
pub fn phrase_after(text: &str, markers: &[&str], terminator: char) -> Option<String> {
    let (_, start) = find_earliest(text, markers)?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| c == terminator || c == '\n')
        .unwrap_or(rest.len());
    non_empty(rest[..end].trim_start_matches(':'))
}

const CURRENCY_MARKERS: &[&str] = &["$", "€", "£", "USD", "EUR", "GBP"];

/// The sentence fragment around the first currency marker, e.g. "$5,000 per year"
pub fn amount_from_text(text: &str) -> Option<String> {
    let start = CURRENCY_MARKERS
        .iter()
        .filter_map(|m| text.find(m))
        .min()?;

    // Walk back to the start of the number when the code trails it ("5000 EUR")
    let head = &text[..start];
    let number_start = head
        .trim_end()
        .rfind(|c: char| !(c.is_ascii_digit() || c == ',' || c == '.'))
        .map(|i| i + head[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0);
    let begin = if head[number_start..].trim().is_empty() { start } else { number_start };

    let rest = &text[begin..];
    let end = SENTENCE_END.find(rest).map_or(rest.len(), |m| m.start());
    non_empty(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_bounded_extraction_stops_at_sentence_and_stop_word() {
        let text = "Eligibility: must hold a degree. Benefits: housing.";
        assert_eq!(
            section_after_keyword(text, &["eligibility:"], &["benefits"]).as_deref(),
            Some("must hold a degree")
        );
    }

    #[test]
    fn test_keyword_bounded_extraction_stop_word_before_terminator() {
        let text = "Requirements: a degree and benefits include housing";
        assert_eq!(
            section_after_keyword(text, &["requirements:"], &["benefits"]).as_deref(),
            Some("a degree and")
        );
    }

    #[test]
    fn test_keyword_bounded_extraction_is_case_insensitive_and_picks_earliest() {
        let text = "CRITERIA: open to all. Eligible: nobody.";
        assert_eq!(
            section_after_keyword(text, &["eligible:", "criteria:"], &[]).as_deref(),
            Some("open to all")
        );
    }

    #[test]
    fn test_keyword_bounded_extraction_after_non_ascii_text() {
        let text = "Förderprogramm für Studierende. ELIGIBILITY: enrolled students. Später mehr";
        assert_eq!(
            section_after_keyword(text, &["eligibility:"], &[]).as_deref(),
            Some("enrolled students")
        );
        assert_eq!(find_earliest("été Été", &["ÉTÉ", "té"]), Some((2, 5)));
    }

    #[test]
    fn test_keyword_bounded_extraction_missing_keyword() {
        assert_eq!(section_after_keyword("Nothing here.", &["eligibility:"], &["benefits"]), None);
        assert_eq!(section_after_keyword("Eligibility: . more", &["eligibility:"], &[]), None);
    }

    #[test]
    fn test_keyword_bounded_extraction_keeps_decimal_amounts() {
        let text = "Deadline: 15.03.2025 at noon. Apply online";
        assert_eq!(
            section_after_keyword(text, &["deadline:"], &[]).as_deref(),
            Some("15.03.2025 at noon")
        );
    }

    #[test]
    fn test_section_lines() {
        let text = "About the role\nRequirements:\n- 3 years Rust\n- Async experience\nBenefits\n- Pension";
        assert_eq!(
            section_lines(text, &["requirements"], &["benefits", "about us"]).as_deref(),
            Some("Requirements:\n- 3 years Rust\n- Async experience")
        );
        assert_eq!(section_lines("no sections", &["requirements"], &["benefits"]), None);
    }

    #[test]
    fn test_mentions_any() {
        assert!(mentions_any("This is a Fully Funded programme", &["fully funded"]));
        assert!(!mentions_any("Partial tuition waiver", &["fully funded", "full scholarship"]));
    }

    #[test]
    fn test_truncate_description() {
        let long = "word ".repeat(200);
        let truncated = truncate_description(&long, 500);
        assert!(truncated.ends_with("..."));
        assert!(truncated.chars().count() <= 503);
        assert_eq!(truncate_description("  short   text ", 500), "short text");
    }

    #[test]
    fn test_truncate_description_respects_char_boundaries() {
        let text = "é".repeat(600);
        let truncated = truncate_description(&text, 500);
        assert_eq!(truncated.chars().count(), 503);
    }

    #[test]
    fn test_phrase_after() {
        let text = "This award is offered by the Gates Foundation. Apply now";
        assert_eq!(
            phrase_after(text, &["offered by", "provided by"], '.').as_deref(),
            Some("the Gates Foundation")
        );
        assert_eq!(phrase_after("no sponsor named", &["offered by"], '.'), None);
    }

    #[test]
    fn test_amount_from_text() {
        assert_eq!(
            amount_from_text("Winners receive $5,000 per year. Renewable").as_deref(),
            Some("$5,000 per year")
        );
        assert_eq!(
            amount_from_text("A stipend of 1400 EUR monthly").as_deref(),
            Some("1400 EUR monthly")
        );
        assert_eq!(amount_from_text("No money mentioned"), None);
    }

    #[test]
    fn test_clean_lines() {
        assert_eq!(clean_lines("  a  \n\n   b   c \n"), "a\nb c");
    }
}
