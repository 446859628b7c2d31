//! Turning a handler name into a handler
//!
//! Lookups walk an ordered list of resolvers: installed plugins first, then
//! built-ins. A resolver that cannot produce the handler (absent file,
//! malformed definition) simply passes, so a lookup ends at "not found"
//! rather than an error.

use std::sync::Arc;
use tracing::{debug, warn};

use super::builtin::{Direct, Generic};
use super::declarative::DeclarativeHandler;
use super::traits::{HandlerError, SiteHandler};
use crate::plugins::{PluginSource, PluginStore};

pub trait HandlerResolver: Send + Sync {
    /// Short name used in logs
    fn label(&self) -> &'static str;

    fn names(&self) -> Vec<String>;

    fn resolve(&self, name: &str) -> Option<Arc<dyn SiteHandler>>;
}

/// Builds a handler out of a plugin file
pub trait PluginLoader: Send + Sync {
    fn load(&self, source: &PluginSource) -> Result<Arc<dyn SiteHandler>, HandlerError>;
}

/// Loads the TOML handler definitions plugins ship as
#[derive(Debug, Default)]
pub struct DeclarativeLoader;

impl PluginLoader for DeclarativeLoader {
    fn load(&self, source: &PluginSource) -> Result<Arc<dyn SiteHandler>, HandlerError> {
        Ok(Arc::new(DeclarativeHandler::from_source(source)?))
    }
}

/// Handlers installed in the plugin directory
#[derive(Clone)]
pub struct PluginResolver {
    store: PluginStore,
    loader: Arc<dyn PluginLoader>,
}

impl PluginResolver {
    pub fn new(store: PluginStore) -> Self {
        Self::with_loader(store, Arc::new(DeclarativeLoader))
    }

    pub fn with_loader(store: PluginStore, loader: Arc<dyn PluginLoader>) -> Self {
        Self { store, loader }
    }

    pub fn store(&self) -> &PluginStore {
        &self.store
    }
}

impl HandlerResolver for PluginResolver {
    fn label(&self) -> &'static str {
        "plugins"
    }

    fn names(&self) -> Vec<String> {
        self.store.names()
    }

    fn resolve(&self, name: &str) -> Option<Arc<dyn SiteHandler>> {
        let source = self.store.source(name)?;
        match self.loader.load(&source) {
            Ok(handler) => Some(handler),
            Err(e) => {
                warn!(
                    handler = name,
                    path = %source.descriptor.path.display(),
                    error = %e,
                    "Ignoring unusable plugin"
                );
                None
            }
        }
    }
}

/// Handlers compiled into the program, in registration order
#[derive(Clone, Default)]
pub struct BuiltinResolver {
    handlers: Vec<Arc<dyn SiteHandler>>,
}

impl BuiltinResolver {
    pub fn new(handlers: Vec<Arc<dyn SiteHandler>>) -> Self {
        Self { handlers }
    }

    pub fn standard() -> Self {
        Self::new(vec![Arc::new(Direct::new()), Arc::new(Generic::new())])
    }

    /// Names of built-ins that claim specific sites
    pub fn specific_names(&self) -> Vec<String> {
        self.names_where(|handler| !handler.is_fallback())
    }

    /// Names of catch-all built-ins, tried last
    pub fn fallback_names(&self) -> Vec<String> {
        self.names_where(|handler| handler.is_fallback())
    }

    fn names_where(&self, keep: impl Fn(&dyn SiteHandler) -> bool) -> Vec<String> {
        self.handlers
            .iter()
            .filter(|handler| keep(handler.as_ref()))
            .map(|handler| handler.name().to_string())
            .collect()
    }
}

impl HandlerResolver for BuiltinResolver {
    fn label(&self) -> &'static str {
        "builtin"
    }

    fn names(&self) -> Vec<String> {
        self.names_where(|_| true)
    }

    fn resolve(&self, name: &str) -> Option<Arc<dyn SiteHandler>> {
        self.handlers
            .iter()
            .find(|handler| handler.name() == name)
            .cloned()
    }
}

/// Resolvers consulted in order; the first one that knows a name wins
#[derive(Default)]
pub struct ResolverChain {
    resolvers: Vec<Box<dyn HandlerResolver>>,
}

impl ResolverChain {
    pub fn new(resolvers: Vec<Box<dyn HandlerResolver>>) -> Self {
        Self { resolvers }
    }

    pub fn push(&mut self, resolver: Box<dyn HandlerResolver>) {
        self.resolvers.push(resolver);
    }

    /// Every name any resolver knows, sorted and de-duplicated
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .resolvers
            .iter()
            .flat_map(|resolver| resolver.names())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn SiteHandler>> {
        for resolver in &self.resolvers {
            if let Some(handler) = resolver.resolve(name) {
                debug!(handler = name, resolver = resolver.label(), "Handler resolved");
                return Some(handler);
            }
        }
        debug!(handler = name, "Handler not found");
        None
    }
}
