// src/browser.rs
//! Thin client for a browserless-style page-rendering service.
//!
//! The social adapter cannot read its target site with a plain HTTP fetch;
//! the service drives a headless browser and returns fully rendered HTML from
//! its `/content` endpoint.

use anyhow::{Context, Result};
use std::time::Duration;

const RENDER_TIMEOUT: Duration = Duration::from_secs(30);

pub struct BrowserClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    cookies: Option<Vec<serde_json::Value>>,
}

impl BrowserClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(RENDER_TIMEOUT)
            .build()
            .context("building browser http client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            cookies: None,
        })
    }

    /// Session cookies injected into every render. Without them pages are
    /// rendered unauthenticated.
    pub fn with_cookies(mut self, cookies: Vec<serde_json::Value>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    /// Render `url` and return the resulting HTML.
    pub async fn content(&self, url: &str) -> Result<String> {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(token) = &self.token {
            endpoint.push_str(&format!("?token={token}"));
        }

        let mut body = serde_json::json!({ "url": url });
        if let Some(cookies) = &self.cookies {
            body["cookies"] = serde_json::Value::Array(cookies.clone());
        }
        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("browser render request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            anyhow::bail!("browser service returned {status}: {message}");
        }

        resp.text().await.context("reading rendered page body")
    }
}
