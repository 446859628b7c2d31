//! Browsing session shared by handlers, backends and the updater

use chrono::{DateTime, Utc};
use reqwest::header::{CONTENT_LENGTH, COOKIE, LAST_MODIFIED};
use reqwest::{Client, Proxy, RequestBuilder, Response};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::Settings;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    #[error("invalid proxy '{proxy}': {reason}")]
    InvalidProxy { proxy: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;

impl SessionError {
    /// Connection-level failure, the kind a broken proxy produces
    pub fn is_connect(&self) -> bool {
        match self {
            SessionError::Request { source, .. } => source.is_connect() || source.is_timeout(),
            _ => false,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    /// Applies to page fetches and probes, never to file transfers
    pub request_timeout: Duration,
    pub user_agent: String,
    pub proxy: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            user_agent: concat!("vidgrab/", env!("CARGO_PKG_VERSION")).to_string(),
            proxy: None,
        }
    }
}

impl HttpConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            user_agent: settings.user_agent.clone(),
            proxy: settings.proxy.clone(),
            ..Default::default()
        }
    }
}

/// Fetched page
#[derive(Debug, Clone)]
pub struct Page {
    /// URL after redirects
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Result of a metadata-only request
#[derive(Debug, Clone, Default)]
pub struct Probe {
    pub content_length: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// HTTP client plus the headers and cookies handlers set during pre-inspection
pub struct Session {
    client: Client,
    config: HttpConfig,
    headers: BTreeMap<String, String>,
    cookies: BTreeMap<String, String>,
}

impl Session {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(url) = config.proxy.as_deref() {
            let proxy = Proxy::all(url).map_err(|e| SessionError::InvalidProxy {
                proxy: url.to_string(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| SessionError::Client(e.to_string()))?;

        Ok(Self {
            client,
            config,
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(HttpConfig::from_settings(settings))
    }

    pub fn has_proxy(&self) -> bool {
        self.config.proxy.is_some()
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn set_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    fn decorate(&self, mut request: RequestBuilder) -> RequestBuilder {
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            request = request.header(COOKIE, cookie);
        }

        request
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|source| SessionError::Request {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    /// Fetch a page as text, following redirects
    pub async fn get(&self, url: &str) -> Result<Page> {
        debug!(url, "Fetching page");

        let request = self
            .decorate(self.client.get(url))
            .timeout(self.config.request_timeout);
        let response = self.send(url, request).await?;

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|source| SessionError::Request {
            url: url.to_string(),
            source,
        })?;

        debug!(url, final_url = %final_url, size = body.len(), "Page fetched");

        Ok(Page {
            url: final_url,
            status,
            body,
        })
    }

    /// Open a streaming GET for a file transfer (no overall timeout)
    pub async fn open(&self, url: &str) -> Result<Response> {
        debug!(url, "Opening transfer");
        let request = self.decorate(self.client.get(url));
        self.send(url, request).await
    }

    /// Metadata-only request
    pub async fn probe(&self, url: &str) -> Result<Probe> {
        let request = self
            .decorate(self.client.head(url))
            .timeout(self.config.request_timeout);
        let response = self.send(url, request).await?;
        let headers = response.headers();

        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());

        let last_modified = headers
            .get(LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_http_date);

        debug!(url, ?content_length, ?last_modified, "Probe completed");

        Ok(Probe {
            content_length,
            last_modified,
        })
    }
}

/// Parse an HTTP date such as `Wed, 21 Oct 2015 07:28:00 GMT`
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert!(config.user_agent.starts_with("vidgrab/"));
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_parse_http_date() {
        let parsed = parse_http_date("Wed, 21 Oct 2015 07:28:00 GMT").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap());
        assert!(parse_http_date("yesterday").is_none());
    }

    #[test]
    fn test_session_records_headers_and_cookies() {
        let mut session = Session::new(HttpConfig::default()).unwrap();
        session.set_header("Referer", "https://example.com/");
        session.set_cookie("age_verified", "1");

        assert_eq!(session.header("Referer"), Some("https://example.com/"));
        assert_eq!(session.cookie("age_verified"), Some("1"));
        assert!(!session.has_proxy());
    }
}
