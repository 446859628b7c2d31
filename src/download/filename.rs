//! Filename helpers: sanitising titles, inferring names from locators

use url::Url;

use crate::handlers::{Stream, TransportKind};

const FORBIDDEN: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Turn a title or suggestion into a safe single-component filename
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_underscore = false;

    for c in name.trim().chars() {
        let mapped = if c.is_whitespace() || c.is_control() || FORBIDDEN.contains(&c) {
            '_'
        } else {
            c
        };

        if mapped == '_' {
            if last_underscore {
                continue;
            }
            last_underscore = true;
        } else {
            last_underscore = false;
        }
        out.push(mapped);
    }

    let trimmed = out.trim_matches(|c| c == '_' || c == '.');
    trimmed.to_string()
}

/// Build a filename from a page title, adding `extension`
pub fn from_title(title: &str, extension: &str) -> Option<String> {
    let base = sanitize(title);
    if base.is_empty() {
        return None;
    }
    Some(format!("{}.{}", base, extension))
}

/// Name a stream after the last path segment of its locator
pub fn infer_from_locator(stream: &Stream) -> String {
    let kind = stream.kind();
    let segment = Url::parse(stream.locator())
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            url::form_urlencoded::parse(segment.as_bytes())
                .map(|(key, value)| {
                    if value.is_empty() {
                        key.into_owned()
                    } else {
                        format!("{}={}", key, value)
                    }
                })
                .collect::<Vec<_>>()
                .join("&")
        })
        .map(|segment| sanitize(&segment))
        .filter(|segment| !segment.is_empty())
        .unwrap_or_else(|| "video".to_string());

    with_extension(segment, kind)
}

fn with_extension(name: String, kind: TransportKind) -> String {
    match (kind, name.rsplit_once('.')) {
        // playlists name the capture, not the file we write
        (TransportKind::Hls, Some((stem, "m3u8"))) => {
            format!("{}.{}", stem, kind.default_extension())
        }
        (_, Some((stem, ext))) if !stem.is_empty() && !ext.is_empty() => name,
        _ => format!("{}.{}", name, kind.default_extension()),
    }
}

/// Human title from a filename: extension dropped, underscores become spaces
pub fn title_from_filename(filename: &str) -> String {
    let base = std::path::Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(filename);

    let stem = match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    };

    stem.replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("My  Great: Video?"), "My_Great_Video");
        assert_eq!(sanitize("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize("clip.mp4"), "clip.mp4");
        assert_eq!(sanitize("   "), "");
    }

    #[test]
    fn test_from_title() {
        assert_eq!(from_title("Cats in space", "mp4").as_deref(), Some("Cats_in_space.mp4"));
        assert_eq!(from_title("///", "mp4"), None);
    }

    #[test]
    fn test_infer_from_http_locator() {
        let stream = Stream::http("https://cdn.example.com/media/holiday.mp4?token=abc");
        assert_eq!(infer_from_locator(&stream), "holiday.mp4");
    }

    #[test]
    fn test_infer_adds_transport_extension() {
        let rtmp = Stream::Rtmp {
            url: "rtmp://media.example.com/vod/episode1".to_string(),
            params: BTreeMap::new(),
        };
        assert_eq!(infer_from_locator(&rtmp), "episode1.flv");

        let hls = Stream::hls("https://cdn.example.com/live/master.m3u8");
        assert_eq!(infer_from_locator(&hls), "master.mp4");
    }

    #[test]
    fn test_infer_falls_back_to_video() {
        assert_eq!(infer_from_locator(&Stream::http("https://example.com/")), "video.mp4");
        assert_eq!(infer_from_locator(&Stream::http("not a url")), "video.mp4");
    }

    #[test]
    fn test_title_from_filename() {
        assert_eq!(title_from_filename("Cats_in_space.mp4"), "Cats in space");
        assert_eq!(title_from_filename("dir/clip.part01_of_02.flv"), "clip.part01 of 02");
        assert_eq!(title_from_filename("noext"), "noext");
    }
}
