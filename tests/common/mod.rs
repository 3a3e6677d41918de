//! Shared helpers for the integration tests: a transport that replays a
//! script instead of touching the network.

#![allow(dead_code)]

use async_trait::async_trait;
use opportunity_scraper::config::ScraperConfig;
use opportunity_scraper::error::TransportError;
use opportunity_scraper::session::SourceSession;
use opportunity_scraper::sources::SourceId;
use opportunity_scraper::transport::{Page, Transport};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub enum Step {
    Serve(Page),
    Fail(String),
}

/// Replays `Step`s in order and records every URL it was asked for.
/// An exhausted script fails the fetch.
pub struct ScriptedTransport {
    script: VecDeque<Step>,
    calls: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<u32>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            script: steps.into(),
            calls: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(Mutex::new(0)),
        }
    }

    /// Handle on the call log that outlives the boxed transport
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    pub fn closes(&self) -> Arc<Mutex<u32>> {
        Arc::clone(&self.closed)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn open(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn fetch(&mut self, url: &str, _wait_for: Option<&str>, _timeout: Duration) -> Result<Page, TransportError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.script.pop_front() {
            Some(Step::Serve(page)) => Ok(Page {
                url: if page.url.is_empty() { url.to_string() } else { page.url },
                ..page
            }),
            Some(Step::Fail(reason)) => Err(TransportError::Worker(reason)),
            None => Err(TransportError::Worker("script exhausted".to_string())),
        }
    }

    async fn close(&mut self) {
        *self.closed.lock().unwrap() += 1;
    }
}

pub fn ok(content: &str) -> Step {
    Step::Serve(Page {
        content: content.to_string(),
        title: String::new(),
        url: String::new(),
        status: Some(200),
    })
}

pub fn status(code: u16, content: &str) -> Step {
    Step::Serve(Page {
        content: content.to_string(),
        title: String::new(),
        url: String::new(),
        status: Some(code),
    })
}

pub fn captcha() -> Step {
    Step::Serve(Page {
        content: "<html><body><h1>Please complete the CAPTCHA to continue</h1></body></html>".to_string(),
        title: "Just a moment...".to_string(),
        url: String::new(),
        status: Some(200),
    })
}

pub fn unreachable() -> Step {
    Step::Fail("connection refused".to_string())
}

/// Defaults with every delay at zero and no browser
pub fn instant_config() -> ScraperConfig {
    ScraperConfig::instant()
}

pub fn scripted_session(id: SourceId, transport: ScriptedTransport, config: &ScraperConfig) -> SourceSession {
    SourceSession::new(id.display_name(), id.slug(), Box::new(transport), config)
}

pub const INDEED_PAGE: &str = r#"
<html><head><title>Rust jobs | Indeed</title></head><body>
  <div class="job_seen_beacon">
    <h2 class="jobTitle"><a class="jcs-JobTitle" href="/rc/clk?jk=a1"><span title="Rust Engineer">Rust Engineer</span></a></h2>
    <span class="companyName">Ferrous Systems</span>
    <div class="companyLocation">Remote</div>
    <div class="metadata">Full-time</div>
    <div class="job-snippet">Async services. Rust experience required.</div>
    <span class="date">Posted 2 days ago</span>
  </div>
  <div class="job_seen_beacon">
    <h2 class="jobTitle"><a class="jcs-JobTitle" href="/rc/clk?jk=b2"><span title="Platform Intern">Platform Intern</span></a></h2>
    <div class="metadata">Internship</div>
  </div>
  <div class="job_seen_beacon">
    <h2 class="jobTitle"><span title="No Link Role">No Link Role</span></h2>
  </div>
</body></html>"#;
