use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d %B, %Y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d-%m-%Y",
];

static RELATIVE_AGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*\+?\s*(minute|min|hour|hr|day|week|month|year)s?\b.*ago").unwrap());

static DEADLINE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(deadline|due date|closing date|closes on|closes|apply by)\s*:?\s*").unwrap()
});

static ORDINAL_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{1,2})(st|nd|rd|th)\b").unwrap());

/// Dates as they appear inside prose, most specific first
static EMBEDDED_DATES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap(),
        Regex::new(r"[A-Za-z]{3,9}\.? \d{1,2},? \d{4}").unwrap(),
        Regex::new(r"\d{1,2} [A-Za-z]{3,9},? \d{4}").unwrap(),
        Regex::new(r"\d{1,2}/\d{1,2}/\d{4}").unwrap(),
        Regex::new(r"\d{1,2}\.\d{1,2}\.\d{4}").unwrap(),
    ]
});

/// Resolve "3 days ago" style text against `now`.
/// Months count as 30 days and years as 365. Anything unrecognised resolves to `now`.
pub fn resolve_relative(text: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let lower = text.trim().to_lowercase();
    if lower.contains("yesterday") {
        return now - Duration::days(1);
    }
    if lower.contains("today") || lower.contains("just now") || lower.contains("just posted") {
        return now;
    }

    let Some(caps) = RELATIVE_AGE.captures(&lower) else {
        return now;
    };
    let Ok(n) = caps[1].parse::<i64>() else {
        return now;
    };
    // Keeps the chrono Duration constructors in range
    let n = n.min(100_000);

    let offset = match &caps[2] {
        "minute" | "min" => Duration::minutes(n),
        "hour" | "hr" => Duration::hours(n),
        "day" => Duration::days(n),
        "week" => Duration::weeks(n),
        "month" => Duration::days(n * 30),
        "year" => Duration::days(n * 365),
        _ => return now,
    };
    now.checked_sub_signed(offset).unwrap_or(now)
}

/// Posting timestamp from either an ISO datetime attribute or relative text
pub fn posted_date(datetime_attr: Option<&str>, relative_text: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    if let Some(date) = datetime_attr.and_then(parse_deadline) {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc);
        }
    }
    match relative_text {
        Some(text) => resolve_relative(text, now),
        None => now,
    }
}

/// Parse a deadline in any of the formats sources use. Never panics; None when unparsable.
pub fn parse_deadline(text: &str) -> Option<NaiveDate> {
    let cleaned = strip_label(text.trim());
    if cleaned.is_empty() {
        return None;
    }
    parse_exact(&cleaned).or_else(|| parse_embedded(&cleaned))
}

fn strip_label(text: &str) -> String {
    let without_label = DEADLINE_LABEL.replace(text, "");
    // "15th March" -> "15 March"
    ORDINAL_SUFFIX.replace_all(&without_label, "$1").trim().to_string()
}

fn parse_exact(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Look for a date inside surrounding prose, e.g. "Applications close March 15, 2025 (noon)"
fn parse_embedded(text: &str) -> Option<NaiveDate> {
    EMBEDDED_DATES.iter().find_map(|re| {
        re.find_iter(text)
            .find_map(|m| parse_exact(&m.as_str().replace('.', "").replace("  ", " ")).or_else(|| parse_exact(m.as_str())))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_relative_days_and_weeks() {
        assert_eq!(resolve_relative("3 days ago", now()).date_naive(), (now() - Duration::days(3)).date_naive());
        assert_eq!(resolve_relative("2 weeks ago", now()).date_naive(), (now() - Duration::days(14)).date_naive());
        assert_eq!(resolve_relative("Posted 1 month ago", now()), now() - Duration::days(30));
        assert_eq!(resolve_relative("5 hours ago", now()), now() - Duration::hours(5));
        assert_eq!(resolve_relative("30+ days ago", now()), now() - Duration::days(30));
    }

    #[test]
    fn test_relative_fallbacks() {
        assert_eq!(resolve_relative("whenever", now()), now());
        assert_eq!(resolve_relative("", now()), now());
        assert_eq!(resolve_relative("Just posted", now()), now());
        assert_eq!(resolve_relative("yesterday", now()), now() - Duration::days(1));
        assert_eq!(resolve_relative("99999999999999999999 days ago", now()), now());
    }

    #[test]
    fn test_deadline_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 15);
        assert_eq!(parse_deadline("2025-03-15"), expected);
        assert_eq!(parse_deadline("2025-03-15T23:59:00Z"), expected);
        assert_eq!(parse_deadline("Sat, 15 Mar 2025 10:00:00 +0000"), expected);
        assert_eq!(parse_deadline("March 15, 2025"), expected);
        assert_eq!(parse_deadline("15 March 2025"), expected);
        assert_eq!(parse_deadline("Deadline: 15th March 2025"), expected);
        assert_eq!(parse_deadline("03/15/2025"), expected);
        assert_eq!(parse_deadline("Applications close March 15, 2025 at noon"), expected);
    }

    #[test]
    fn test_deadline_inside_prose() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 15);
        assert_eq!(parse_deadline("Submit by 2025-03-15 (CET)"), expected);
        assert_eq!(parse_deadline("Bewerbungsschluss ist der 15.03.2025, 12 Uhr"), expected);
        assert_eq!(parse_deadline("Closes on: 15th March, 2025"), expected);
        assert_eq!(parse_deadline("Apply by 03/15/2025 or earlier"), expected);
    }

    #[test]
    fn test_deadline_unparsable() {
        assert_eq!(parse_deadline("Rolling"), None);
        assert_eq!(parse_deadline(""), None);
        assert_eq!(parse_deadline("Varies"), None);
    }

    #[test]
    fn test_posted_date_prefers_attribute() {
        let from_attr = posted_date(Some("2025-03-01"), Some("3 days ago"), now());
        assert_eq!(from_attr.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        let from_text = posted_date(Some("garbage"), Some("3 days ago"), now());
        assert_eq!(from_text, now() - Duration::days(3));
        assert_eq!(posted_date(None, None, now()), now());
    }
}
