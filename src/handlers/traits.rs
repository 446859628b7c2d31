use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use super::types::{ExtractionResult, Preferences};
use crate::plugins::PluginDescriptor;
use crate::session::{Session, SessionError};

/// Handler errors
#[derive(Debug, Error)]
pub enum HandlerError {
    /// An optional capability the handler needs is not installed
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    #[error("page fetch failed: {0}")]
    Network(#[from] SessionError),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("invalid handler definition {name}: {reason}")]
    InvalidDefinition { name: String, reason: String },
}

/// Site handler contract shared by built-ins and plugins
///
/// A handler claims URLs through [`SiteHandler::matches`], may adjust the
/// session before anything is fetched, and turns a page into an
/// [`ExtractionResult`].
#[async_trait]
pub trait SiteHandler: Send + Sync {
    fn name(&self) -> &str;

    fn matches(&self, url: &str) -> bool;

    /// Fallback handlers are only tried after every specific handler
    fn is_fallback(&self) -> bool {
        false
    }

    /// Pre-inspection hook: set cookies or headers before the page is fetched
    async fn prepare_session(&self, _session: &mut Session, _url: &str) -> Result<(), HandlerError> {
        Ok(())
    }

    async fn extract(
        &self,
        session: &Session,
        url: &str,
        prefs: &Preferences,
    ) -> Result<ExtractionResult, HandlerError>;

    /// Custom updater replacing the default `Last-Modified` check
    fn updater(&self) -> Option<Arc<dyn PluginUpdater>> {
        None
    }
}

/// Plugin-specific update procedure
#[async_trait]
pub trait PluginUpdater: Send + Sync {
    /// Returns `true` when the plugin file was replaced
    async fn update(
        &self,
        plugin: &PluginDescriptor,
        session: &Session,
    ) -> Result<bool, HandlerError>;
}
