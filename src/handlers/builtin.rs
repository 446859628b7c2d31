//! Handlers compiled into the program
//!
//! [`Direct`] takes links that already point at a media file. [`Generic`]
//! is the catch-all: it scans any page for OpenGraph video tags and
//! absolute media URLs.

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;
use url::Url;

use super::declarative::named_like;
use super::traits::{HandlerError, SiteHandler};
use super::types::{ExtractionResult, Preferences, Single, Stream};
use crate::session::Session;

const MEDIA_EXTENSIONS: &[&str] = &["mp4", "m4v", "flv", "webm", "mkv", "mov", "mp3", "m4a", "m3u8"];

fn media_extension(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    let (_, ext) = segment.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    MEDIA_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

fn stream_for(url: &str) -> Stream {
    let is_playlist = Url::parse(url)
        .ok()
        .and_then(|url| media_extension(&url))
        .is_some_and(|ext| ext == "m3u8");
    if is_playlist {
        Stream::hls(url)
    } else {
        Stream::http(url)
    }
}

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
}

/// Links straight to a media file; nothing to fetch
#[derive(Debug, Default)]
pub struct Direct;

impl Direct {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SiteHandler for Direct {
    fn name(&self) -> &str {
        "Direct"
    }

    fn matches(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|url| media_extension(&url))
            .is_some()
    }

    async fn extract(
        &self,
        _session: &Session,
        url: &str,
        _prefs: &Preferences,
    ) -> Result<ExtractionResult, HandlerError> {
        Ok(ExtractionResult::Single(Single::new(stream_for(url))))
    }
}

/// Last resort for any http(s) page
#[derive(Debug)]
pub struct Generic {
    /// Tried in order; earlier patterns find better candidates
    locators: Vec<Regex>,
    titles: Vec<Regex>,
}

impl Default for Generic {
    fn default() -> Self {
        Self::new()
    }
}

impl Generic {
    pub fn new() -> Self {
        Self {
            locators: compile_all(&[
                r#"<meta[^>]+property=["']og:video(?::secure_url|:url)?["'][^>]+content=["'](?P<url>[^"']+)["']"#,
                r#"<source[^>]+src=["'](?P<url>[^"']+)["']"#,
                r#"(?P<url>https?://[^\s"'<>]+\.(?:mp4|m4v|flv|webm|m3u8)(?:\?[^\s"'<>]*)?)"#,
            ]),
            titles: compile_all(&[
                r#"<meta[^>]+property=["']og:title["'][^>]+content=["'](?P<title>[^"']+)["']"#,
                r"(?is)<title[^>]*>(?P<title>.*?)</title>",
            ]),
        }
    }

    fn candidates(&self, body: &str, base: Option<&Url>) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for pattern in &self.locators {
            for caps in pattern.captures_iter(body) {
                let Some(raw) = caps.name("url") else {
                    continue;
                };
                let raw = raw.as_str().replace("&amp;", "&");
                let resolved = match base {
                    Some(base) => base.join(&raw).ok(),
                    None => Url::parse(&raw).ok(),
                };
                let Some(url) = resolved.map(|url| url.to_string()) else {
                    continue;
                };
                if !found.contains(&url) {
                    found.push(url);
                }
            }
        }
        found
    }

    fn title(&self, body: &str) -> Option<String> {
        self.titles.iter().find_map(|pattern| {
            let title = pattern.captures(body)?.name("title")?.as_str().trim();
            (!title.is_empty()).then(|| title.replace("&amp;", "&"))
        })
    }
}

#[async_trait]
impl SiteHandler for Generic {
    fn name(&self) -> &str {
        "Generic"
    }

    fn matches(&self, url: &str) -> bool {
        Url::parse(url).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
    }

    fn is_fallback(&self) -> bool {
        true
    }

    async fn extract(
        &self,
        session: &Session,
        url: &str,
        prefs: &Preferences,
    ) -> Result<ExtractionResult, HandlerError> {
        let page = session.get(url).await?;
        let base = Url::parse(&page.url).ok();
        let candidates = self.candidates(&page.body, base.as_ref());
        debug!(url = %page.url, candidates = candidates.len(), "Generic scan finished");

        let index = prefs.quality.pick(candidates.len()).ok_or_else(|| {
            HandlerError::Extraction(format!("no video found on {}", page.url))
        })?;

        let mut single = Single::new(stream_for(&candidates[index]));
        if let Some(name) = self
            .title(&page.body)
            .and_then(|title| named_like(&title, &single.stream))
        {
            single = single.with_filename(name);
        }
        Ok(ExtractionResult::Single(single))
    }
}
