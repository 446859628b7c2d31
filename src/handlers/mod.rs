//! Site handlers
//!
//! ## Key Components
//!
//! - [`SiteHandler`] - contract every built-in and plugin handler fulfils
//! - [`ExtractionResult`] - what a handler found: one stream, an ordered
//!   list, or a multi-part video
//! - [`ResolverChain`] - name lookup across installed plugins and built-ins
//! - [`HandlerRegistry`] - chooses the handler for a URL
//! - [`DeclarativeHandler`] - handler built from a plugin's TOML definition

mod builtin;
mod declarative;
mod registry;
mod resolver;
mod traits;
pub(crate) mod types;

pub use builtin::{Direct, Generic};
pub use declarative::DeclarativeHandler;
pub use registry::{HandlerRegistry, canonicalize};
pub use resolver::{
    BuiltinResolver, DeclarativeLoader, HandlerResolver, PluginLoader, PluginResolver,
    ResolverChain,
};
pub use traits::{HandlerError, PluginUpdater, SiteHandler};
pub use types::{ExtractionResult, Part, Preferences, Single, Stream, TransportKind};
