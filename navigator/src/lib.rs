//! Browse a server-held collection of observations one record at a time.
//!
//! The [`Navigator`] keeps a cursor into the filtered, sorted result set,
//! resolves positions to records through an [`ObservationSource`] and keeps
//! the per-record collaborators pointed at whatever is on screen.
//! [`NavigatorRuntime`] wires it to query edits, commands and collection
//! notifications.

pub mod client;
pub mod config;
pub mod debounce;
pub mod error;
pub mod events;
pub mod navigator;
pub mod position;
pub mod query;
pub mod record;
pub mod runtime;
pub mod scope;
pub mod session;
pub mod source;
pub mod sse;

pub use client::HttpObservationClient;
pub use config::NavigatorConfig;
pub use error::NavigatorError;
pub use error::Result;
pub use events::Invalidation;
pub use events::InvalidationListener;
pub use events::ObjectEventBus;
pub use navigator::EXPORT_NOTICE;
pub use navigator::Navigator;
pub use navigator::NavigatorOptions;
pub use navigator::NavigatorSnapshot;
pub use navigator::ResortPolicy;
pub use navigator::Scopes;
pub use position::Position;
pub use query::SharedQuery;
pub use runtime::NavCommand;
pub use runtime::NavigatorHandle;
pub use runtime::NavigatorRuntime;
pub use scope::ScopeRegistry;
pub use scope::ScopedManager;
pub use source::IndexLookup;
pub use source::ObservationSource;
pub use sse::EventFeed;
