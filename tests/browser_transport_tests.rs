use opportunity_scraper::config::{DelayRange, ScraperConfig};
use opportunity_scraper::error::TransportError;
use opportunity_scraper::transport::{BrowserTransport, Transport};
use std::time::Duration;

fn transport() -> BrowserTransport {
    let config = ScraperConfig::default();
    BrowserTransport::new(&config.transport, &config.identity, &config.pacing)
}

#[tokio::test]
async fn test_fetch_without_session_fails() {
    let mut browser = transport();
    let result = browser.fetch("https://example.com", None, Duration::from_secs(5)).await;
    assert!(matches!(result, Err(TransportError::NotOpen)));
    // Closing a transport that never opened is fine
    browser.close().await;
}

#[tokio::test]
#[ignore] // Requires Chrome
async fn test_fetch_scroll_and_reread() {
    let mut browser = transport();
    browser.open().await.expect("Chrome should launch");

    let page = browser
        .fetch("https://example.com", Some("h1"), Duration::from_secs(30))
        .await
        .unwrap();
    assert!(page.title.contains("Example"));
    assert!(page.content.contains("<h1>"));

    browser.scroll_to_bottom(DelayRange::new(100, 200)).await.unwrap();
    browser.simulate_interaction().await.unwrap();
    let reread = browser.current_page().await.unwrap().expect("live document");
    assert!(reread.content.contains("Example Domain"));

    browser.close().await;
    browser.close().await;
}

#[tokio::test]
#[ignore] // Requires Chrome
async fn test_missing_element_still_returns_rendered_page() {
    let mut browser = transport();
    browser.open().await.expect("Chrome should launch");
    let page = browser
        .fetch("https://example.com", Some("div.never-present"), Duration::from_secs(30))
        .await
        .unwrap();
    assert!(page.content.contains("Example Domain"));
    browser.close().await;
}
