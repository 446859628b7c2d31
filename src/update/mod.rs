//! Self-update and plugin update
//!
//! The program compares its version against a remote descriptor and either
//! defers to the package manager that installed it or swaps its own
//! executable. Plugins are refreshed when their update URL reports a newer
//! `Last-Modified` than the local file.

pub mod descriptor;
pub mod plugins;
pub mod replace;
pub mod self_update;
pub mod version;

use std::path::PathBuf;
use thiserror::Error;

use crate::download::TransportError;
use crate::handlers::HandlerError;
use crate::session::SessionError;

pub use descriptor::ReleaseDescriptor;
pub use plugins::PluginUpdateReport;
pub use replace::atomic_replace;
pub use self_update::{UpdateManager, UpdateStatus};
pub use version::{Version, VersionError};

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("could not fetch update information from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: SessionError,
    },

    #[error("malformed update descriptor: {0}")]
    Descriptor(String),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download of {url} failed: {source}")]
    Transfer {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("'{command}' failed: {reason}")]
    UpgradeCommand { command: String, reason: String },

    #[error("a newer copy of plugin {name} exists but could not be installed")]
    PluginUpdateFailed { name: String },

    #[error("plugin {name}: {source}")]
    Handler {
        name: String,
        #[source]
        source: HandlerError,
    },

    #[error("cannot locate the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),
}
