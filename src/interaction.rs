//! Interaction provider: the only place the program asks the user anything
//!
//! [`Terminal`] prompts through inquire. [`Scripted`] answers from a queue
//! and falls back to deterministic defaults, which is what non-interactive
//! runs and tests use.

use inquire::error::InquireResult;
use inquire::{Confirm, InquireError, MultiSelect, Select, Text};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::warn;

pub trait Interaction: Send + Sync {
    /// Pick a save-as name among distinct suggestions (most specific last)
    fn choose_filename(&self, candidates: &[String]) -> String;

    /// Raw selection text for a numbered list, e.g. `""`, `"2"`, `"1-3"`
    fn ask_selection(&self, choices: &[String]) -> String;

    fn confirm(&self, prompt: &str) -> bool;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("invalid choice '{0}'")]
    InvalidChoice(String),

    #[error("nothing to choose from")]
    Empty,
}

/// Parse a selection into 0-based indices
///
/// Empty input picks the first entry. Otherwise numbers (1-based) and
/// `a-b` ranges separated by commas or whitespace, kept in input order.
pub fn parse_selection(input: &str, available: usize) -> Result<Vec<usize>, SelectionError> {
    if available == 0 {
        return Err(SelectionError::Empty);
    }

    let input = input.trim();
    if input.is_empty() {
        return Ok(vec![0]);
    }

    let in_range = |n: usize| (1..=available).contains(&n);
    let mut picked = Vec::new();

    for token in input.split(|c: char| c == ',' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        let invalid = || SelectionError::InvalidChoice(token.to_string());

        match token.split_once('-') {
            Some((start, end)) => {
                let start: usize = start.trim().parse().map_err(|_| invalid())?;
                let end: usize = end.trim().parse().map_err(|_| invalid())?;
                if !in_range(start) || !in_range(end) || start > end {
                    return Err(invalid());
                }
                picked.extend((start..=end).map(|n| n - 1));
            }
            None => {
                let n: usize = token.parse().map_err(|_| invalid())?;
                if !in_range(n) {
                    return Err(invalid());
                }
                picked.push(n - 1);
            }
        }
    }

    if picked.is_empty() {
        return Err(SelectionError::InvalidChoice(input.to_string()));
    }
    Ok(picked)
}

/// Prompts on the controlling terminal
#[derive(Debug, Default)]
pub struct Terminal;

const OTHER_NAME: &str = "Another name...";

/// Cancelled or failed prompts fall back to the caller's default
fn answered<T>(result: InquireResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => None,
        Err(e) => {
            warn!(error = %e, "Prompt failed, using the default");
            None
        }
    }
}

impl Interaction for Terminal {
    fn choose_filename(&self, candidates: &[String]) -> String {
        let Some(default) = candidates.last() else {
            return String::new();
        };

        let mut options = candidates.to_vec();
        options.push(OTHER_NAME.to_string());

        let picked = answered(
            Select::new("Save as:", options)
                .with_starting_cursor(candidates.len() - 1)
                .raw_prompt(),
        );
        match picked {
            Some(option) if option.index < candidates.len() => option.value,
            Some(_) => answered(Text::new("File name:").with_default(default).prompt())
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| default.clone()),
            None => default.clone(),
        }
    }

    fn ask_selection(&self, choices: &[String]) -> String {
        let picked = answered(
            MultiSelect::new("Choose (none picks the first):", choices.to_vec()).raw_prompt(),
        );
        picked
            .unwrap_or_default()
            .iter()
            .map(|option| (option.index + 1).to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn confirm(&self, prompt: &str) -> bool {
        answered(Confirm::new(prompt).with_default(false).prompt()).unwrap_or(false)
    }
}

/// Queue-driven answers with deterministic defaults
#[derive(Debug, Default)]
pub struct Scripted {
    answers: Mutex<VecDeque<String>>,
    assume_yes: bool,
    prompts: AtomicUsize,
}

impl Scripted {
    /// Never prompts: last suggestion, first result, `confirm` returns `assume_yes`
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            ..Default::default()
        }
    }

    pub fn with_answers<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// How many questions were asked so far
    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::Relaxed)
    }

    fn next_answer(&self) -> Option<String> {
        self.prompts.fetch_add(1, Ordering::Relaxed);
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
    }
}

impl Interaction for Scripted {
    fn choose_filename(&self, candidates: &[String]) -> String {
        let fallback = candidates.last().cloned().unwrap_or_default();
        match self.next_answer() {
            Some(answer) => match answer.parse::<usize>() {
                Ok(n) if (1..=candidates.len()).contains(&n) => candidates[n - 1].clone(),
                _ if answer.is_empty() => fallback,
                _ => answer,
            },
            None => fallback,
        }
    }

    fn ask_selection(&self, _choices: &[String]) -> String {
        self.next_answer().unwrap_or_default()
    }

    fn confirm(&self, _prompt: &str) -> bool {
        match self.next_answer() {
            Some(answer) => matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"),
            None => self.assume_yes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selection_is_first() {
        assert_eq!(parse_selection("", 3), Ok(vec![0]));
        assert_eq!(parse_selection("   ", 3), Ok(vec![0]));
    }

    #[test]
    fn test_range_selects_all_in_order() {
        assert_eq!(parse_selection("1-3", 3), Ok(vec![0, 1, 2]));
    }

    #[test]
    fn test_mixed_selection() {
        assert_eq!(parse_selection("3, 1", 3), Ok(vec![2, 0]));
        assert_eq!(parse_selection("2 4-5", 5), Ok(vec![1, 3, 4]));
    }

    #[test]
    fn test_out_of_range_is_invalid() {
        assert_eq!(
            parse_selection("5", 3),
            Err(SelectionError::InvalidChoice("5".to_string()))
        );
        assert!(parse_selection("0", 3).is_err());
        assert!(parse_selection("2-9", 3).is_err());
        assert!(parse_selection("3-1", 3).is_err());
        assert!(parse_selection("abc", 3).is_err());
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(parse_selection("", 0), Err(SelectionError::Empty));
    }

    #[test]
    fn test_scripted_defaults() {
        let scripted = Scripted::new(true);
        let candidates = vec!["a.mp4".to_string(), "b.mp4".to_string()];

        assert_eq!(scripted.choose_filename(&candidates), "b.mp4");
        assert_eq!(scripted.ask_selection(&candidates), "");
        assert!(scripted.confirm("Update?"));
        assert_eq!(scripted.prompts(), 3);
    }

    #[test]
    fn test_scripted_answers() {
        let scripted = Scripted::with_answers(["1", "custom.mp4", "n"]);
        let candidates = vec!["a.mp4".to_string(), "b.mp4".to_string()];

        assert_eq!(scripted.choose_filename(&candidates), "a.mp4");
        assert_eq!(scripted.choose_filename(&candidates), "custom.mp4");
        assert!(!scripted.confirm("Update?"));
    }

    #[test]
    fn test_cancelled_prompt_falls_back() {
        assert_eq!(answered(Ok("b.mp4")), Some("b.mp4"));
        assert_eq!(answered::<String>(Err(InquireError::OperationCanceled)), None);
        assert_eq!(answered::<bool>(Err(InquireError::OperationInterrupted)), None);
        assert_eq!(answered::<bool>(Err(InquireError::NotTTY)), None);
    }
}
