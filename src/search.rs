//! Search provider boundary
//!
//! Inputs that are not URLs form a search phrase. Providers turn the phrase
//! into candidate pages; the user picks among them through the interaction
//! provider. No provider ships with the program.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::interaction::{Interaction, SelectionError, parse_selection};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no search provider is available for '{0}'")]
    NoProvider(String),

    #[error("nothing found for '{0}'")]
    NoResults(String),

    #[error("search through {provider} failed: {reason}")]
    Provider { provider: String, reason: String },

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(
        &self,
        session: &Session,
        phrase: &str,
    ) -> Result<Vec<SearchResult>, SearchError>;
}

/// Run every provider, then let the user choose which results to fetch
///
/// With `assume_yes` the first result is taken without asking.
pub async fn search_and_select(
    providers: &[Arc<dyn SearchProvider>],
    session: &Session,
    phrase: &str,
    interaction: &dyn Interaction,
    assume_yes: bool,
) -> Result<Vec<String>, SearchError> {
    if providers.is_empty() {
        return Err(SearchError::NoProvider(phrase.to_string()));
    }

    let mut results = Vec::new();
    for provider in providers {
        let found = provider.search(session, phrase).await?;
        info!(provider = provider.name(), results = found.len(), "Search finished");
        results.extend(found);
    }

    if results.is_empty() {
        return Err(SearchError::NoResults(phrase.to_string()));
    }

    let chosen = if assume_yes {
        vec![0]
    } else {
        let titles: Vec<String> = results
            .iter()
            .map(|result| format!("{} <{}>", result.title, result.url))
            .collect();
        let answer = interaction.ask_selection(&titles);
        parse_selection(&answer, results.len())?
    };

    Ok(chosen
        .into_iter()
        .map(|index| results[index].url.clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::Scripted;
    use crate::session::HttpConfig;

    struct Fixed(Vec<SearchResult>);

    #[async_trait]
    impl SearchProvider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn search(
            &self,
            _session: &Session,
            _phrase: &str,
        ) -> Result<Vec<SearchResult>, SearchError> {
            Ok(self.0.clone())
        }
    }

    fn providers() -> Vec<Arc<dyn SearchProvider>> {
        let results = (1..=3)
            .map(|n| SearchResult {
                title: format!("Result {}", n),
                url: format!("https://example.com/v/{}", n),
            })
            .collect();
        vec![Arc::new(Fixed(results))]
    }

    fn session() -> Session {
        Session::new(HttpConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_default_selection_is_first_result() {
        let scripted = Scripted::with_answers([""]);
        let urls = search_and_select(&providers(), &session(), "cats", &scripted, false)
            .await
            .unwrap();
        assert_eq!(urls, vec!["https://example.com/v/1"]);
    }

    #[tokio::test]
    async fn test_range_selects_everything_in_order() {
        let scripted = Scripted::with_answers(["1-3"]);
        let urls = search_and_select(&providers(), &session(), "cats", &scripted, false)
            .await
            .unwrap();
        assert_eq!(
            urls,
            vec![
                "https://example.com/v/1",
                "https://example.com/v/2",
                "https://example.com/v/3"
            ]
        );
    }

    #[tokio::test]
    async fn test_out_of_range_choice_is_an_error() {
        let scripted = Scripted::with_answers(["5"]);
        let err = search_and_select(&providers(), &session(), "cats", &scripted, false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::Selection(SelectionError::InvalidChoice(_))
        ));
    }

    #[tokio::test]
    async fn test_assume_yes_skips_the_prompt() {
        let scripted = Scripted::new(true);
        let urls = search_and_select(&providers(), &session(), "cats", &scripted, true)
            .await
            .unwrap();
        assert_eq!(urls.len(), 1);
        assert_eq!(scripted.prompts(), 0);
    }

    #[tokio::test]
    async fn test_no_provider() {
        let scripted = Scripted::new(false);
        let err = search_and_select(&[], &session(), "cats", &scripted, false)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::NoProvider(_)));
    }
}
