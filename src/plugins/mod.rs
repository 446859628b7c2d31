//! Installed plugin files
//!
//! Plugins live as one `<HandlerName>.toml` per handler in the plugin
//! directory. The directory is re-scanned on every run; nothing is cached.

pub mod install;
pub mod store;

use std::path::PathBuf;
use thiserror::Error;

use crate::update::UpdateError;

pub use install::install;
pub use store::{PluginDescriptor, PluginSource, PluginStore};

/// Extension every plugin file carries
pub const PLUGIN_EXTENSION: &str = "toml";

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin file names must end in .toml: '{0}'")]
    InvalidName(String),

    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Update(#[from] UpdateError),
}
