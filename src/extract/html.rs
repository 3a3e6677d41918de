//! Thin helpers over `scraper` for the "try several selectors" pattern.
//! Invalid selectors behave like selectors that match nothing.

use super::text::{clean_lines, clean_text, mentions_any, non_empty};
use scraper::{ElementRef, Html, Selector};

pub fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// All elements of `doc` matching `css`, in document order
pub fn fragments<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(sel) => doc.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// First descendant matching any candidate, trying candidates in order
pub fn first<'a>(el: ElementRef<'a>, candidates: &[&str]) -> Option<ElementRef<'a>> {
    candidates.iter().find_map(|css| {
        let sel = selector(css)?;
        el.select(&sel).next()
    })
}

/// Whitespace-collapsed text of an element
pub fn element_text(el: ElementRef) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

/// Text of an element with one line per text node
pub fn element_lines(el: ElementRef) -> String {
    clean_lines(&el.text().collect::<Vec<_>>().join("\n"))
}

/// Text of the first candidate that matches and has non-blank text
pub fn first_text(el: ElementRef, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|css| {
        let sel = selector(css)?;
        el.select(&sel).find_map(|found| non_empty(&element_text(found)))
    })
}

/// Attribute value of the first candidate carrying it
pub fn first_attr(el: ElementRef, candidates: &[&str], attr: &str) -> Option<String> {
    candidates.iter().find_map(|css| {
        let sel = selector(css)?;
        el.select(&sel)
            .find_map(|found| found.value().attr(attr).and_then(non_empty))
    })
}

/// A container's `item_css` children joined by newlines, or the container's own
/// text when it has no such children
pub fn list_text(el: ElementRef, candidates: &[&str], item_css: &str) -> Option<String> {
    let container = first(el, candidates)?;
    let items: Vec<String> = match selector(item_css) {
        Some(sel) => container
            .select(&sel)
            .filter_map(|item| non_empty(&element_text(item)))
            .collect(),
        None => Vec::new(),
    };
    if items.is_empty() {
        non_empty(&element_text(container))
    } else {
        Some(items.join("\n"))
    }
}

/// Contents of `<title>`, empty when absent
pub fn document_title(doc: &Html) -> String {
    fragments(doc, "title")
        .into_iter()
        .next()
        .map(element_text)
        .unwrap_or_default()
}

/// Text a reader would see: everything outside script, style, noscript and template
pub fn visible_text(doc: &Html) -> String {
    const HIDDEN: &[&str] = &["script", "style", "noscript", "template", "head"];
    let text: Vec<&str> = doc
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|el| HIDDEN.contains(&el.value().name()));
            if hidden {
                None
            } else {
                Some(&**text)
            }
        })
        .collect();
    clean_text(&text.join(" "))
}

fn class_mentions(el: ElementRef, keywords: &[&str]) -> bool {
    el.value().attr("class").map_or(false, |class| mentions_any(class, keywords))
}

/// Descendants named in `tags` whose class attribute mentions any keyword.
/// Used on pages without stable class names; nested matches are all returned.
pub fn classed<'a>(root: ElementRef<'a>, tags: &[&str], keywords: &[&str]) -> Vec<ElementRef<'a>> {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| tags.contains(&el.value().name()) && class_mentions(*el, keywords))
        .collect()
}

/// First descendant named in `tags` that has no class at all or a class mentioning a keyword
pub fn first_loosely_classed<'a>(root: ElementRef<'a>, tags: &[&str], keywords: &[&str]) -> Option<ElementRef<'a>> {
    root.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|el| tags.contains(&el.value().name()))
        .find(|el| el.value().attr("class").is_none() || class_mentions(*el, keywords))
}

/// `href` of the element itself, or of its nearest enclosing anchor
pub fn own_or_parent_href(el: ElementRef) -> Option<String> {
    if let Some(href) = el.value().attr("href") {
        return non_empty(href);
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "a")
        .and_then(|a| a.value().attr("href").and_then(non_empty))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = r#"
        <div class="card">
          <h3 class="title">  Rust   Engineer </h3>
          <span class="empty"> </span>
          <span class="company">Acme</span>
          <a class="link" href="/jobs/1">Apply</a>
          <ul class="reqs"><li>Rust</li><li> Tokio </li></ul>
          <div class="plain">Just text</div>
        </div>"#;

    fn with_card<F: FnOnce(ElementRef)>(f: F) {
        let doc = Html::parse_fragment(CARD);
        let card = fragments(&doc, "div.card").into_iter().next().unwrap();
        f(card);
    }

    #[test]
    fn test_first_text_skips_missing_and_blank() {
        with_card(|card| {
            assert_eq!(first_text(card, &["h2.title", "h3.title"]).as_deref(), Some("Rust Engineer"));
            assert_eq!(first_text(card, &["span.empty", "span.company"]).as_deref(), Some("Acme"));
            assert_eq!(first_text(card, &["span.nothing"]), None);
        });
    }

    #[test]
    fn test_first_attr() {
        with_card(|card| {
            assert_eq!(first_attr(card, &["a.link"], "href").as_deref(), Some("/jobs/1"));
            assert_eq!(first_attr(card, &["a.link"], "data-id"), None);
        });
    }

    #[test]
    fn test_list_text() {
        with_card(|card| {
            assert_eq!(list_text(card, &["ul.reqs"], "li").as_deref(), Some("Rust\nTokio"));
            assert_eq!(list_text(card, &["div.plain"], "li").as_deref(), Some("Just text"));
            assert_eq!(list_text(card, &["div.none"], "li"), None);
        });
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        with_card(|card| {
            assert_eq!(first_text(card, &["[[["]), None);
        });
        let doc = Html::parse_document("<p>x</p>");
        assert!(fragments(&doc, "[[[").is_empty());
    }

    #[test]
    fn test_document_title() {
        let doc = Html::parse_document("<html><head><title> Just a moment... </title></head></html>");
        assert_eq!(document_title(&doc), "Just a moment...");
        assert_eq!(document_title(&Html::parse_document("<p>none</p>")), "");
    }

    #[test]
    fn test_visible_text_skips_scripts() {
        let doc = Html::parse_document(
            "<html><head><title>T</title><script>var captcha = 1;</script></head>\
             <body><p>Hello</p><script>window.cloudflare = true;</script><noscript>enable js</noscript><p>world</p></body></html>",
        );
        assert_eq!(visible_text(&doc), "Hello world");
    }

    #[test]
    fn test_classed_and_loosely_classed() {
        let doc = Html::parse_document(
            r#"<div class="Scholarship-Result"><h3 class="meta">x</h3><h3 class="item-title">Award</h3><p>Body</p></div>
               <article class="news">n</article><div class="program-box">p</div>"#,
        );
        let root = doc.root_element();
        let found = classed(root, &["div", "article"], &["scholarship", "program"]);
        assert_eq!(found.len(), 2);
        let title = first_loosely_classed(found[0], &["h1", "h2", "h3"], &["title"]).unwrap();
        assert_eq!(element_text(title), "Award");
        let body = first_loosely_classed(found[0], &["div", "p"], &["desc"]).unwrap();
        assert_eq!(element_text(body), "Body");
        assert!(first_loosely_classed(found[1], &["h2"], &["title"]).is_none());
    }

    #[test]
    fn test_parent_href() {
        let doc = Html::parse_fragment(r#"<a href="/s/1"><h2>Title</h2></a>"#);
        let heading = fragments(&doc, "h2").into_iter().next().unwrap();
        assert_eq!(own_or_parent_href(heading).as_deref(), Some("/s/1"));
    }
}
