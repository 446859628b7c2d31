//! Handlers defined by a plugin's TOML file
//!
//! ```toml
//! patterns = ['^https?://(www\.)?exampletube\.com/watch']
//! update_urls = ["https://example.org/plugins/ExampleTube.toml"]
//! requires = ["rtmpdump"]
//! headers = { Referer = "https://exampletube.com/" }
//! cookies = { age_verified = "1" }
//!
//! [extract]
//! transport = "http"
//! locator = ['"(?P<url>https://cdn[^"]+\.mp4)"']
//! title = '<h1>(?P<title>[^<]+)</h1>'
//! subtitles = '"(?P<url>https://[^"]+\.srt)"'
//! multipart = false
//! rtmp = { swfVfy = "https://exampletube.com/player.swf" }
//! ```

use async_trait::async_trait;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;
use url::Url;

use super::traits::{HandlerError, SiteHandler};
use super::types::{ExtractionResult, Part, Preferences, Single, Stream, TransportKind};
use crate::download::filename::{from_title, infer_from_locator};
use crate::plugins::PluginSource;
use crate::session::Session;

#[derive(Debug, Deserialize)]
struct Definition {
    patterns: Vec<String>,
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    cookies: BTreeMap<String, String>,
    #[serde(default)]
    fallback: bool,
    extract: Rules,
}

#[derive(Debug, Deserialize)]
struct Rules {
    #[serde(default)]
    transport: TransportKind,
    locator: Vec<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    subtitles: Option<String>,
    #[serde(default)]
    multipart: bool,
    #[serde(default)]
    rtmp: BTreeMap<String, String>,
}

/// A locator found on the page, with the size the page advertised for it
#[derive(Debug, Clone, PartialEq, Eq)]
struct Found {
    url: String,
    size: Option<u64>,
}

#[derive(Debug)]
pub struct DeclarativeHandler {
    name: String,
    patterns: Vec<Regex>,
    requires: Vec<String>,
    headers: BTreeMap<String, String>,
    cookies: BTreeMap<String, String>,
    fallback: bool,
    transport: TransportKind,
    locators: Vec<Regex>,
    title: Option<Regex>,
    subtitles: Option<Regex>,
    multipart: bool,
    rtmp: BTreeMap<String, String>,
}

impl DeclarativeHandler {
    pub fn from_source(source: &PluginSource) -> Result<Self, HandlerError> {
        Self::parse(&source.descriptor.name, &source.contents)
    }

    pub fn parse(name: &str, contents: &str) -> Result<Self, HandlerError> {
        let invalid = |reason: String| HandlerError::InvalidDefinition {
            name: name.to_string(),
            reason,
        };
        let compile = |pattern: &String| Regex::new(pattern).map_err(|e| invalid(e.to_string()));

        let definition: Definition =
            toml::from_str(contents).map_err(|e| invalid(e.to_string()))?;
        if definition.extract.locator.is_empty() {
            return Err(invalid("no locator patterns".to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            patterns: definition.patterns.iter().map(compile).collect::<Result<_, _>>()?,
            requires: definition.requires,
            headers: definition.headers,
            cookies: definition.cookies,
            fallback: definition.fallback,
            transport: definition.extract.transport,
            locators: definition
                .extract
                .locator
                .iter()
                .map(compile)
                .collect::<Result<_, _>>()?,
            title: definition.extract.title.as_ref().map(compile).transpose()?,
            subtitles: definition.extract.subtitles.as_ref().map(compile).transpose()?,
            multipart: definition.extract.multipart,
            rtmp: definition.extract.rtmp,
        })
    }

    fn check_requirements(&self) -> Result<(), HandlerError> {
        match self.requires.iter().find(|program| find_program(program).is_none()) {
            Some(missing) => Err(HandlerError::MissingDependency(format!(
                "{} needs the '{}' program",
                self.name, missing
            ))),
            None => Ok(()),
        }
    }

    fn stream(&self, url: String) -> Stream {
        match self.transport {
            TransportKind::Http => Stream::Http { url },
            TransportKind::Hls => Stream::Hls { url },
            TransportKind::Ffmpeg => Stream::Ffmpeg { url },
            TransportKind::Rtmp => Stream::Rtmp {
                url,
                params: self.rtmp.clone(),
            },
        }
    }

    /// Every locator match in pattern order, without repeats
    fn find_locators(&self, body: &str, base: Option<&Url>) -> Vec<Found> {
        let mut found: Vec<Found> = Vec::new();
        for pattern in &self.locators {
            for caps in pattern.captures_iter(body) {
                let Some(url) = capture(&caps, "url").and_then(|raw| absolutize(raw, base)) else {
                    continue;
                };
                if found.iter().any(|existing| existing.url == url) {
                    continue;
                }
                let size = caps.name("size").and_then(|m| m.as_str().parse().ok());
                found.push(Found { url, size });
            }
        }
        found
    }

    fn find_title(&self, body: &str) -> Option<String> {
        let caps = self.title.as_ref()?.captures(body)?;
        capture(&caps, "title")
            .map(|title| decode_entities(title.trim()))
            .filter(|title| !title.is_empty())
    }

    fn find_subtitles(&self, body: &str, base: Option<&Url>) -> Option<String> {
        let caps = self.subtitles.as_ref()?.captures(body)?;
        capture(&caps, "url").and_then(|raw| absolutize(raw, base))
    }
}

#[async_trait]
impl SiteHandler for DeclarativeHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, url: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(url))
    }

    fn is_fallback(&self) -> bool {
        self.fallback
    }

    async fn prepare_session(&self, session: &mut Session, _url: &str) -> Result<(), HandlerError> {
        for (name, value) in &self.headers {
            session.set_header(name, value);
        }
        for (name, value) in &self.cookies {
            session.set_cookie(name, value);
        }
        Ok(())
    }

    async fn extract(
        &self,
        session: &Session,
        url: &str,
        prefs: &Preferences,
    ) -> Result<ExtractionResult, HandlerError> {
        self.check_requirements()?;

        let page = session.get(url).await?;
        let base = Url::parse(&page.url).ok();
        let found = self.find_locators(&page.body, base.as_ref());
        debug!(handler = %self.name, candidates = found.len(), "Locators found");

        let title = self.find_title(&page.body);

        if self.multipart && found.len() > 1 {
            let count = found.len();
            let parts: Vec<Part> = found
                .into_iter()
                .enumerate()
                .map(|(i, part)| Part {
                    stream: self.stream(part.url),
                    index: i + 1,
                    count,
                    expected_size: part.size,
                })
                .collect();
            let filenames = title
                .as_deref()
                .and_then(|title| named_like(title, &parts[0].stream))
                .into_iter()
                .collect();
            return Ok(ExtractionResult::MultiPart { parts, filenames });
        }

        let index = prefs
            .quality
            .pick(found.len())
            .ok_or_else(|| HandlerError::Extraction(format!("no stream found on {}", page.url)))?;
        let chosen = found[index].url.clone();

        let mut video = Single::new(self.stream(chosen));
        if let Some(name) = title.as_deref().and_then(|title| named_like(title, &video.stream)) {
            video = video.with_filename(name);
        }

        let subtitle_url = if prefs.subtitles {
            self.find_subtitles(&page.body, base.as_ref())
        } else {
            None
        };
        if let Some(subtitle_url) = subtitle_url {
            let mut subtitles = Single::new(Stream::http(subtitle_url));
            if let Some(name) = title
                .as_deref()
                .and_then(|title| named_like(title, &subtitles.stream))
            {
                subtitles = subtitles.with_filename(name);
            }
            return Ok(ExtractionResult::List(vec![video, subtitles]));
        }

        Ok(ExtractionResult::Single(video))
    }
}

/// Named group if the pattern has one, else the first group, else the match
fn capture<'h>(caps: &Captures<'h>, group: &str) -> Option<&'h str> {
    caps.name(group)
        .or_else(|| caps.get(1))
        .or_else(|| caps.get(0))
        .map(|m| m.as_str())
}

fn absolutize(raw: &str, base: Option<&Url>) -> Option<String> {
    let raw = decode_entities(raw.trim());
    match Url::parse(&raw) {
        Ok(url) => Some(url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base.and_then(|base| base.join(&raw).ok()).map(|url| url.to_string())
        }
        Err(_) => None,
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

/// Title-based filename carrying the extension the locator implies
pub(crate) fn named_like(title: &str, stream: &Stream) -> Option<String> {
    let inferred = infer_from_locator(stream);
    let extension = inferred
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or(stream.kind().default_extension());
    from_title(title, extension)
}

/// First executable called `program` on `PATH`
pub(crate) fn find_program(program: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Quality;

    const DEFINITION: &str = r#"
patterns = ['^https?://(www\.)?clips\.example\.com/watch/']
headers = { Referer = "https://clips.example.com/" }
cookies = { age_verified = "1" }

[extract]
locator = ['data-src="(?P<url>[^"]+\.mp4)"']
title = '<h1 class="title">(?P<title>[^<]+)</h1>'
subtitles = 'data-subs="(?P<url>[^"]+)"'
"#;

    const PAGE: &str = r#"
<h1 class="title">Cats &amp; Dogs</h1>
<video data-src="https://cdn.example.com/hd/cats.mp4"></video>
<video data-src="/sd/cats.mp4"></video>
<video data-src="https://cdn.example.com/hd/cats.mp4"></video>
<track data-subs="/subs/cats.en.srt">
"#;

    fn handler() -> DeclarativeHandler {
        DeclarativeHandler::parse("Clips", DEFINITION).unwrap()
    }

    #[test]
    fn test_matches_patterns() {
        let handler = handler();
        assert!(handler.matches("https://clips.example.com/watch/42"));
        assert!(handler.matches("http://www.clips.example.com/watch/42"));
        assert!(!handler.matches("https://other.example.com/watch/42"));
        assert!(!handler.is_fallback());
    }

    #[test]
    fn test_finds_locators_in_order_without_repeats() {
        let base = Url::parse("https://clips.example.com/watch/42").unwrap();
        let found = handler().find_locators(PAGE, Some(&base));
        assert_eq!(
            found.iter().map(|f| f.url.as_str()).collect::<Vec<_>>(),
            vec![
                "https://cdn.example.com/hd/cats.mp4",
                "https://clips.example.com/sd/cats.mp4"
            ]
        );
    }

    #[test]
    fn test_title_is_decoded() {
        assert_eq!(handler().find_title(PAGE).as_deref(), Some("Cats & Dogs"));
        let name = named_like("Cats & Dogs", &Stream::http("https://x/hd/cats.mp4"));
        assert_eq!(name.as_deref(), Some("Cats_&_Dogs.mp4"));
    }

    #[tokio::test]
    async fn test_prepare_session_sets_headers_and_cookies() {
        let mut session = Session::new(crate::session::HttpConfig::default()).unwrap();
        handler()
            .prepare_session(&mut session, "https://clips.example.com/watch/42")
            .await
            .unwrap();
        assert_eq!(session.header("Referer"), Some("https://clips.example.com/"));
        assert_eq!(session.cookie("age_verified"), Some("1"));
    }

    #[test]
    fn test_invalid_definitions() {
        assert!(matches!(
            DeclarativeHandler::parse("Bad", "patterns = ['(']\n[extract]\nlocator = ['x']"),
            Err(HandlerError::InvalidDefinition { .. })
        ));
        assert!(matches!(
            DeclarativeHandler::parse("Bad", "patterns = ['x']\n[extract]\nlocator = []"),
            Err(HandlerError::InvalidDefinition { .. })
        ));
        assert!(matches!(
            DeclarativeHandler::parse("Bad", "patterns = ['x']"),
            Err(HandlerError::InvalidDefinition { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_program_is_missing_dependency() {
        let handler = DeclarativeHandler::parse(
            "Rtmpish",
            "patterns = ['x']\nrequires = ['vidgrab-no-such-tool']\n[extract]\ntransport = 'rtmp'\nlocator = ['x']",
        )
        .unwrap();
        let session = Session::new(crate::session::HttpConfig::default()).unwrap();
        let prefs = Preferences {
            quality: Quality::High,
            ..Default::default()
        };

        let err = handler
            .extract(&session, "https://x/", &prefs)
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::MissingDependency(_)));
    }

    #[test]
    fn test_rtmp_streams_carry_params() {
        let handler = DeclarativeHandler::parse(
            "Live",
            "patterns = ['x']\n[extract]\ntransport = 'rtmp'\nlocator = ['x']\nrtmp = { swfVfy = 'https://x/p.swf' }",
        )
        .unwrap();
        match handler.stream("rtmp://x/vod".to_string()) {
            Stream::Rtmp { params, .. } => {
                assert_eq!(params.get("swfVfy").map(String::as_str), Some("https://x/p.swf"))
            }
            other => panic!("unexpected stream: {:?}", other),
        }
    }
}
