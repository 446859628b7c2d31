use std::sync::Arc;
use tracing::debug;
use url::Url;

use super::resolver::{BuiltinResolver, PluginResolver, ResolverChain};
use super::traits::SiteHandler;
use crate::config::Settings;
use crate::plugins::PluginStore;

/// Picks the handler for a URL out of built-ins and installed plugins
pub struct HandlerRegistry {
    builtins: BuiltinResolver,
    chain: ResolverChain,
}

impl HandlerRegistry {
    pub fn new(plugins: PluginResolver, builtins: BuiltinResolver) -> Self {
        let chain = ResolverChain::new(vec![Box::new(plugins), Box::new(builtins.clone())]);
        Self { builtins, chain }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            PluginResolver::new(PluginStore::new(settings.plugins_dir())),
            BuiltinResolver::standard(),
        )
    }

    /// Look a handler up by name, plugins first
    pub fn find(&self, name: &str) -> Option<Arc<dyn SiteHandler>> {
        self.chain.resolve(name)
    }

    /// Names in the order they are tried: specific built-ins, plugin-only
    /// handlers, then fallbacks
    pub fn candidate_names(&self) -> Vec<String> {
        let specific = self.builtins.specific_names();
        let fallback = self.builtins.fallback_names();

        let plugin_only = self
            .chain
            .names()
            .into_iter()
            .filter(|name| !specific.contains(name) && !fallback.contains(name));

        specific
            .iter()
            .cloned()
            .chain(plugin_only)
            .chain(fallback.iter().cloned())
            .collect()
    }

    /// First handler whose patterns accept the canonical form of `url`
    pub fn resolve(&self, url: &str) -> Option<(Arc<dyn SiteHandler>, String)> {
        let canonical = canonicalize(url)?;

        for name in self.candidate_names() {
            let Some(handler) = self.find(&name) else {
                continue;
            };
            if handler.matches(&canonical) {
                debug!(handler = %name, url = %canonical, "Handler selected");
                return Some((handler, canonical));
            }
        }

        debug!(url = %canonical, "No handler accepts URL");
        None
    }
}

/// Trimmed, `http://` added when no scheme is given, normalised
pub fn canonicalize(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    Url::parse(&with_scheme).ok().map(|url| url.to_string())
}
