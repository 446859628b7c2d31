//! Batch driver: resolve, prepare, extract and dispatch each URL in turn

use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::download::{Backends, DispatchError, DispatchOutcome, Dispatcher};
use crate::handlers::{HandlerError, HandlerRegistry, Preferences};
use crate::interaction::Interaction;
use crate::observability::{BatchSnapshot, BatchStats};
use crate::search::{SearchError, SearchProvider, search_and_select};
use crate::session::{Session, SessionError};

/// Why one URL of the batch failed
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("no handler accepts {0}")]
    NoHandler(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("{handler}: {source}")]
    Handler {
        handler: String,
        #[source]
        source: HandlerError,
    },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

pub struct App {
    settings: Settings,
    registry: HandlerRegistry,
    dispatcher: Dispatcher,
    interaction: Arc<dyn Interaction>,
    interactive: bool,
    search_providers: Vec<Arc<dyn SearchProvider>>,
}

impl App {
    pub fn new(settings: Settings, interaction: Arc<dyn Interaction>, interactive: bool) -> Self {
        Self {
            registry: HandlerRegistry::from_settings(&settings),
            dispatcher: Dispatcher::new(&settings, interactive, interaction.clone()),
            settings,
            interaction,
            interactive,
            search_providers: Vec::new(),
        }
    }

    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_backends(mut self, backends: Backends) -> Self {
        self.dispatcher = self.dispatcher.with_backends(backends);
        self
    }

    pub fn with_search_provider(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.search_providers.push(provider);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Turn a search phrase into the URLs the user picked
    pub async fn search(&self, phrase: &str) -> Result<Vec<String>, SearchError> {
        let session = Session::from_settings(&self.settings).map_err(|e| SearchError::Provider {
            provider: "session".to_string(),
            reason: e.to_string(),
        })?;
        search_and_select(
            &self.search_providers,
            &session,
            phrase,
            self.interaction.as_ref(),
            self.settings.yes || !self.interactive,
        )
        .await
    }

    /// Process every URL in order; one failure never stops the others
    pub async fn run_batch(&self, urls: &[String]) -> BatchSnapshot {
        let stats = BatchStats::new();

        for (i, url) in urls.iter().enumerate() {
            let remaining = urls.len() - i - 1;
            match self.process(url, remaining).await {
                Ok(DispatchOutcome::InfoShown) => {
                    stats.url_succeeded();
                    break;
                }
                Ok(DispatchOutcome::Completed { files, skipped }) => {
                    info!(url = %url, files = files.len(), skipped, "Done");
                    stats.parts_skipped(skipped);
                    stats.url_succeeded();
                }
                Err(e) => {
                    self.report(url, &e);
                    stats.url_failed();
                }
            }
        }

        let snapshot = stats.snapshot();
        info!(
            succeeded = snapshot.succeeded,
            failed = snapshot.failed,
            "Batch finished"
        );
        snapshot
    }

    async fn process(&self, url: &str, remaining: usize) -> Result<DispatchOutcome, UrlError> {
        let (handler, canonical) = self
            .registry
            .resolve(url)
            .ok_or_else(|| UrlError::NoHandler(url.to_string()))?;
        let name = handler.name().to_string();
        info!(url = %canonical, handler = %name, "Processing");

        let wrap = |source: HandlerError| UrlError::Handler {
            handler: name.clone(),
            source,
        };

        let mut session = Session::from_settings(&self.settings)?;
        handler
            .prepare_session(&mut session, &canonical)
            .await
            .map_err(wrap)?;

        let prefs = Preferences::from_settings(&self.settings, self.interactive);
        let result = handler
            .extract(&session, &canonical, &prefs)
            .await
            .map_err(wrap)?;

        Ok(self.dispatcher.dispatch(&session, &result, remaining).await?)
    }

    fn report(&self, url: &str, err: &UrlError) {
        error!(url, error = %err, "Failed");

        match err {
            UrlError::Handler {
                source: HandlerError::MissingDependency(what),
                ..
            } => {
                warn!("{}. Install it (check your package manager) and try again.", what);
            }
            UrlError::Handler {
                source: HandlerError::Network(e),
                ..
            }
            | UrlError::Session(e)
                if e.is_connect() && self.settings.proxy.is_some() =>
            {
                warn!("Could not connect; check that the proxy is reachable and correct.");
            }
            UrlError::NoHandler(_) => {
                warn!("This does not look like a page any installed handler understands.");
            }
            _ => {
                warn!(
                    "If the page plays in a browser, the site may have changed. \
                     Try --update for newer plugins, or rerun with --debug."
                );
            }
        }
    }
}
