//! Download dispatch
//!
//! An [`ExtractionResult`](crate::handlers::ExtractionResult) is flattened
//! into ordered [`WorkItem`]s by [`plan`], then each item is handed to the
//! [`Backend`] registered for its transport.

pub mod backends;
pub mod dispatcher;
pub mod filename;
pub mod parts;
pub mod plan;

pub use backends::{Backend, Backends, Player, TransportError, fetch_to_file};
pub use dispatcher::{Action, DispatchError, DispatchOutcome, Dispatcher};
pub use plan::{FilenamePolicy, WorkItem, plan};
