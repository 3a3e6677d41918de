use url::Url;

/// Resolve an href found on a page against the source's base URL.
///
/// Absolute http(s) links pass through, relative and protocol-relative links are
/// joined onto `base`. Script, mail and fragment-only links resolve to None.
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let lower = href.to_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("mailto:") || lower.starts_with("tel:") {
        return None;
    }

    let resolved = match Url::parse(href) {
        Ok(absolute) => absolute,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base).ok()?.join(href).ok()?,
        Err(_) => return None,
    };

    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Append query parameters to `base`, skipping None values.
/// Returns `base` unchanged when it is not a valid URL.
pub fn with_query(base: &str, params: &[(&str, Option<String>)]) -> String {
    let Ok(mut url) = Url::parse(base) else {
        return base.to_string();
    };
    let present: Vec<(&str, &str)> = params
        .iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v.trim())))
        .filter(|(_, v)| !v.is_empty())
        .collect();
    if !present.is_empty() {
        url.query_pairs_mut().extend_pairs(present);
    }
    url.to_string()
}

/// Percent-encode a user-supplied filter for use in a query string or path segment
pub fn encode(value: &str) -> String {
    urlencoding::encode(value.trim()).into_owned()
}

/// Lower-case, hyphen-separated slug for path-style filters ("Computer Science" -> "computer-science")
pub fn slug(value: &str) -> String {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
