use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::config::{Quality, Settings};

/// Protocol a locator requires
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Progressive HTTP download
    #[default]
    Http,
    Rtmp,
    Hls,
    /// Anything ffmpeg can capture
    Ffmpeg,
}

impl TransportKind {
    /// Extension used when a locator does not carry one
    pub fn default_extension(&self) -> &'static str {
        match self {
            TransportKind::Http => "mp4",
            TransportKind::Rtmp => "flv",
            TransportKind::Hls | TransportKind::Ffmpeg => "mp4",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportKind::Http => "http",
            TransportKind::Rtmp => "rtmp",
            TransportKind::Hls => "hls",
            TransportKind::Ffmpeg => "ffmpeg",
        };
        f.write_str(name)
    }
}

/// A locator tagged with the transport it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stream {
    Http { url: String },
    /// `params` become `--key value` pairs for rtmpdump (`playpath`, `swfVfy`, ...)
    Rtmp {
        url: String,
        params: BTreeMap<String, String>,
    },
    Hls { url: String },
    Ffmpeg { url: String },
}

impl Stream {
    pub fn http(url: impl Into<String>) -> Self {
        Stream::Http { url: url.into() }
    }

    pub fn hls(url: impl Into<String>) -> Self {
        Stream::Hls { url: url.into() }
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            Stream::Http { .. } => TransportKind::Http,
            Stream::Rtmp { .. } => TransportKind::Rtmp,
            Stream::Hls { .. } => TransportKind::Hls,
            Stream::Ffmpeg { .. } => TransportKind::Ffmpeg,
        }
    }

    pub fn locator(&self) -> &str {
        match self {
            Stream::Http { url }
            | Stream::Rtmp { url, .. }
            | Stream::Hls { url }
            | Stream::Ffmpeg { url } => url,
        }
    }
}

/// One stream with its filename suggestions, most specific last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Single {
    pub stream: Stream,
    pub filenames: Vec<String>,
}

impl Single {
    pub fn new(stream: Stream) -> Self {
        Self {
            stream,
            filenames: Vec::new(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filenames.push(filename.into());
        self
    }
}

/// One segment of a multi-part video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub stream: Stream,
    /// 1-based
    pub index: usize,
    pub count: usize,
    pub expected_size: Option<u64>,
}

/// What a handler found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Single(Single),
    /// Streams downloaded in order, e.g. video then subtitles
    List(Vec<Single>),
    MultiPart {
        parts: Vec<Part>,
        filenames: Vec<String>,
    },
}

impl ExtractionResult {
    /// Number of leaf streams
    pub fn len(&self) -> usize {
        match self {
            ExtractionResult::Single(_) => 1,
            ExtractionResult::List(items) => items.len(),
            ExtractionResult::MultiPart { parts, .. } => parts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything a handler is told about the user's wishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    pub quality: Quality,
    pub subtitles: bool,
    pub interactive: bool,
}

impl Preferences {
    pub fn from_settings(settings: &Settings, interactive: bool) -> Self {
        Self {
            quality: settings.quality,
            subtitles: settings.subtitles,
            interactive: interactive && !settings.yes,
        }
    }
}
