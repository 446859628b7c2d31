//! Flattening an extraction result into ordered work items

use std::path::PathBuf;
use tracing::debug;

use super::filename::{infer_from_locator, sanitize};
use super::parts::part_target;
use crate::handlers::{ExtractionResult, Single, Stream, TransportKind};
use crate::interaction::Interaction;

/// One concrete download unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub stream: Stream,
    pub target: PathBuf,
    /// `(index, count)` for multi-part results
    pub part: Option<(usize, usize)>,
    pub expected_size: Option<u64>,
}

impl WorkItem {
    pub fn transport(&self) -> TransportKind {
        self.stream.kind()
    }

    pub fn locator(&self) -> &str {
        self.stream.locator()
    }
}

/// How the save-as filename gets decided for one download
pub struct FilenamePolicy<'a> {
    pub explicit: Option<&'a str>,
    pub interactive: bool,
    pub interaction: &'a dyn Interaction,
}

impl FilenamePolicy<'_> {
    /// Explicit name, else the single or most specific suggestion, else the
    /// locator's own name; several distinct suggestions prompt when interactive
    pub fn save_as(&self, hints: &[String], stream: &Stream) -> String {
        if let Some(explicit) = self.explicit {
            return explicit.to_string();
        }

        let distinct = distinct_hints(hints);
        match distinct.len() {
            0 => infer_from_locator(stream),
            1 => distinct[0].clone(),
            _ if self.interactive => {
                let chosen = self.interaction.choose_filename(&distinct);
                if chosen.trim().is_empty() {
                    distinct[distinct.len() - 1].clone()
                } else {
                    chosen
                }
            }
            _ => distinct[distinct.len() - 1].clone(),
        }
    }
}

/// Sanitised, de-duplicated suggestions keeping their order
fn distinct_hints(hints: &[String]) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::new();
    for hint in hints {
        let clean = sanitize(hint);
        if clean.is_empty() {
            continue;
        }
        distinct.retain(|existing| existing != &clean);
        distinct.push(clean);
    }
    distinct
}

/// Own most specific suggestion or the locator's name, never prompting
fn secondary_name(single: &Single) -> String {
    distinct_hints(&single.filenames)
        .pop()
        .unwrap_or_else(|| infer_from_locator(&single.stream))
}

/// Derive work items; the save-as name is decided once per download
pub fn plan(result: &ExtractionResult, policy: &FilenamePolicy<'_>) -> Vec<WorkItem> {
    let items: Vec<WorkItem> = match result {
        ExtractionResult::Single(single) => vec![WorkItem {
            target: PathBuf::from(policy.save_as(&single.filenames, &single.stream)),
            stream: single.stream.clone(),
            part: None,
            expected_size: None,
        }],
        ExtractionResult::List(singles) => singles
            .iter()
            .enumerate()
            .map(|(i, single)| {
                let name = if i == 0 {
                    policy.save_as(&single.filenames, &single.stream)
                } else {
                    secondary_name(single)
                };
                WorkItem {
                    stream: single.stream.clone(),
                    target: PathBuf::from(name),
                    part: None,
                    expected_size: None,
                }
            })
            .collect(),
        ExtractionResult::MultiPart { parts, filenames } => {
            let Some(first) = parts.first() else {
                return Vec::new();
            };
            let base = PathBuf::from(policy.save_as(filenames, &first.stream));

            parts
                .iter()
                .map(|part| WorkItem {
                    stream: part.stream.clone(),
                    target: part_target(&base, part.index, part.count),
                    part: (part.count > 1).then_some((part.index, part.count)),
                    expected_size: part.expected_size,
                })
                .collect()
        }
    };

    debug!(items = items.len(), "Planned work items");
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::Part;
    use crate::interaction::Scripted;

    fn policy<'a>(
        explicit: Option<&'a str>,
        interactive: bool,
        interaction: &'a Scripted,
    ) -> FilenamePolicy<'a> {
        FilenamePolicy {
            explicit,
            interactive,
            interaction,
        }
    }

    #[test]
    fn test_single_without_hints_uses_locator_name() {
        let scripted = Scripted::new(false);
        let result = ExtractionResult::Single(Single::new(Stream::http(
            "https://cdn.example.com/v/holiday.mp4",
        )));

        let items = plan(&result, &policy(None, false, &scripted));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].target, PathBuf::from("holiday.mp4"));
        assert_eq!(scripted.prompts(), 0);
    }

    #[test]
    fn test_explicit_filename_wins() {
        let scripted = Scripted::new(false);
        let result = ExtractionResult::Single(
            Single::new(Stream::http("https://x/a.mp4"))
                .with_filename("a.mp4")
                .with_filename("Nice_Title.mp4"),
        );

        let items = plan(&result, &policy(Some("mine.mp4"), true, &scripted));
        assert_eq!(items[0].target, PathBuf::from("mine.mp4"));
        assert_eq!(scripted.prompts(), 0);
    }

    #[test]
    fn test_most_specific_hint_when_not_interactive() {
        let scripted = Scripted::new(false);
        let result = ExtractionResult::Single(
            Single::new(Stream::http("https://x/a.mp4"))
                .with_filename("a.mp4")
                .with_filename("Nice Title.mp4"),
        );

        let items = plan(&result, &policy(None, false, &scripted));
        assert_eq!(items[0].target, PathBuf::from("Nice_Title.mp4"));
        assert_eq!(scripted.prompts(), 0);
    }

    #[test]
    fn test_duplicate_hints_do_not_prompt() {
        let scripted = Scripted::new(false);
        let result = ExtractionResult::Single(
            Single::new(Stream::http("https://x/a.mp4"))
                .with_filename("same.mp4")
                .with_filename("same.mp4"),
        );

        let items = plan(&result, &policy(None, true, &scripted));
        assert_eq!(items[0].target, PathBuf::from("same.mp4"));
        assert_eq!(scripted.prompts(), 0);
    }

    #[test]
    fn test_multipart_prompts_once() {
        let scripted = Scripted::with_answers(["1"]);
        let parts = (1..=3)
            .map(|index| Part {
                stream: Stream::http(format!("https://x/seg{}.flv", index)),
                index,
                count: 3,
                expected_size: Some(100),
            })
            .collect();
        let result = ExtractionResult::MultiPart {
            parts,
            filenames: vec!["first.flv".to_string(), "second.flv".to_string()],
        };

        let items = plan(&result, &policy(None, true, &scripted));
        assert_eq!(scripted.prompts(), 1);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].target, PathBuf::from("first.part01_of_03.flv"));
        assert_eq!(items[2].target, PathBuf::from("first.part03_of_03.flv"));
        assert_eq!(items[1].part, Some((2, 3)));
        assert_eq!(items[1].expected_size, Some(100));
    }

    #[test]
    fn test_single_part_multipart_has_no_suffix() {
        let scripted = Scripted::new(false);
        let result = ExtractionResult::MultiPart {
            parts: vec![Part {
                stream: Stream::http("https://x/only.flv"),
                index: 1,
                count: 1,
                expected_size: None,
            }],
            filenames: vec!["movie.flv".to_string()],
        };

        let items = plan(&result, &policy(None, false, &scripted));
        assert_eq!(items[0].target, PathBuf::from("movie.flv"));
        assert_eq!(items[0].part, None);
    }

    #[test]
    fn test_list_names_secondary_items_independently() {
        let scripted = Scripted::new(false);
        let result = ExtractionResult::List(vec![
            Single::new(Stream::hls("https://x/master.m3u8")).with_filename("Show.mp4"),
            Single::new(Stream::http("https://x/subs/en.srt")).with_filename("Show.srt"),
            Single::new(Stream::http("https://x/extra/poster.jpg")),
        ]);

        let items = plan(&result, &policy(Some("override.mp4"), false, &scripted));
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].target, PathBuf::from("override.mp4"));
        assert_eq!(items[0].transport(), TransportKind::Hls);
        assert_eq!(items[1].target, PathBuf::from("Show.srt"));
        assert_eq!(items[2].target, PathBuf::from("poster.jpg"));
    }
}
