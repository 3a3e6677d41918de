use crate::anti_detection::random_user_agent;
use crate::config::TransportConfig;
use crate::extract::html::document_title;
use crate::transport::Page;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use scraper::Html;
use std::time::Duration;
use tokio::time::sleep;

/// Configuration for the static HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub max_retries: usize,
    pub initial_retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
    pub enable_cookies: bool,
    pub enable_gzip: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_transport(&TransportConfig::default())
    }
}

impl HttpClientConfig {
    pub fn from_transport(config: &TransportConfig) -> Self {
        Self {
            timeout: config.http_timeout(),
            max_retries: config.http_max_retries,
            initial_retry_delay_ms: config.http_initial_retry_delay_ms,
            max_retry_delay_ms: config.http_max_retry_delay_ms,
            enable_cookies: config.enable_cookies,
            enable_gzip: config.enable_compression,
        }
    }
}

/// reqwest client that looks like a desktop browser and retries transient failures
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(random_user_agent())
            .cookie_store(config.enable_cookies)
            .gzip(config.enable_gzip)
            .brotli(config.enable_gzip)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .default_headers(browser_headers())
            .build()?;

        Ok(Self { client, config })
    }

    /// Exponential backoff with ±25% jitter
    fn calculate_retry_delay(&self, attempt: usize) -> Duration {
        let base_delay = self.config.initial_retry_delay_ms;
        let max_delay = self.config.max_retry_delay_ms;
        let delay_ms = base_delay
            .saturating_mul(2u64.saturating_pow(attempt as u32))
            .min(max_delay);

        let jitter = rand::thread_rng().gen_range(0.75..=1.25);
        Duration::from_millis((delay_ms as f64 * jitter) as u64)
    }

    fn is_retryable_status(status: StatusCode) -> bool {
        matches!(
            status.as_u16(),
            // Rate limiting
            429 |
            // Server errors
            500 | 502 | 503 | 504 |
            // Cloudflare errors
            520 | 521 | 522 | 523 | 524 | 525 | 526 | 527
        )
    }

    fn is_retryable_error(e: &reqwest::Error) -> bool {
        e.is_timeout() || e.is_connect() || e.status().map(Self::is_retryable_status).unwrap_or(false)
    }

    /// GET with a fresh user agent per attempt.
    /// Retryable statuses are returned as-is once retries run out.
    pub async fn get_with_retry(
        &self,
        url: &str,
        timeout: Option<Duration>,
        extra_headers: Option<&HeaderMap>,
    ) -> Result<Response, reqwest::Error> {
        let attempts = self.config.max_retries + 1;
        let mut attempt = 0;

        loop {
            let mut request = self.client.get(url).header(USER_AGENT, random_user_agent());
            if let Some(headers) = extra_headers {
                request = request.headers(headers.clone());
            }
            if let Some(timeout) = timeout {
                request = request.timeout(timeout);
            }
            let last_attempt = attempt + 1 >= attempts;

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if !Self::is_retryable_status(status) || last_attempt {
                        return Ok(response);
                    }
                    log::warn!(
                        "Received retryable status {} for {}, attempt {}/{}",
                        status,
                        url,
                        attempt + 1,
                        attempts
                    );
                }
                Err(e) => {
                    if !Self::is_retryable_error(&e) || last_attempt {
                        return Err(e);
                    }
                    log::warn!("Request failed for {}, attempt {}/{}: {}", url, attempt + 1, attempts, e);
                }
            }

            sleep(self.calculate_retry_delay(attempt)).await;
            attempt += 1;
        }
    }

    /// Fetch a URL into a `Page`, keeping the status so callers can judge blocks
    pub async fn get_page(
        &self,
        url: &str,
        timeout: Duration,
        extra_headers: Option<&HeaderMap>,
    ) -> Result<Page, reqwest::Error> {
        let response = self.get_with_retry(url, Some(timeout), extra_headers).await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content = response.text().await?;
        let title = page_title(&content);

        Ok(Page {
            content,
            title,
            url: final_url,
            status: Some(status),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn page_title(content: &str) -> String {
    document_title(&Html::parse_document(content))
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert("Accept-Language", HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert("DNT", HeaderValue::from_static("1"));
    headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("none"));
    headers.insert("Sec-Fetch-User", HeaderValue::from_static("?1"));
    headers.insert("Cache-Control", HeaderValue::from_static("max-age=0"));
    headers
}

/// Headers for JSON APIs, replacing the document-navigation defaults
pub fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("empty"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("cors"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(HttpClient::new().is_ok());
    }

    #[test]
    fn test_retry_delay_calculation() {
        let client = HttpClient::new().unwrap();
        let delay0 = client.calculate_retry_delay(0).as_millis();
        let delay3 = client.calculate_retry_delay(3).as_millis();
        assert!((375..=625).contains(&delay0));
        assert!((3000..=5000).contains(&delay3));
        let capped = client.calculate_retry_delay(40).as_millis();
        assert!(capped <= 10_000);
    }

    #[test]
    fn test_retryable_status() {
        assert!(HttpClient::is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(HttpClient::is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(HttpClient::is_retryable_status(StatusCode::from_u16(522).unwrap()));
        assert!(!HttpClient::is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!HttpClient::is_retryable_status(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_page_title() {
        assert_eq!(page_title("<html><head><title>Jobs | Indeed</title></head></html>"), "Jobs | Indeed");
        assert_eq!(page_title("{\"results\": []}"), "");
    }

    #[test]
    fn test_config_from_transport() {
        let mut transport = TransportConfig::default();
        transport.http_max_retries = 0;
        let config = HttpClientConfig::from_transport(&transport);
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
