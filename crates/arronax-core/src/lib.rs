//! State and orchestration layer between `arronax-api` and the CLI / TUI.
//!
//! This crate owns the explorer's state model and the routines that keep it
//! in sync with a Conseil server:
//!
//! - **[`Explorer`]**: central facade. Builds one client per configured
//!   network, runs the thunks (fetch attributes, columns and items, submit a
//!   query, switch network, look up a record by primary key) and spawns a
//!   command processor for interactive use.
//!   [`Explorer::oneshot()`](Explorer::oneshot) is the lightweight mode for
//!   single CLI invocations.
//!
//! - **[`StateStore`]**: a `tokio::sync::watch` channel holding an immutable
//!   [`ExplorerState`] snapshot. Every change goes through
//!   [`StoreAction`] and the pure reducer, so subscribers always see
//!   consistent state.
//!
//! - **[`StateStream`]**: subscription handle exposing `current()` /
//!   `latest()` / `changed()` for reactive rendering.
//!
//! - **[`selectors`]**: read-only projections of a snapshot (items, columns,
//!   filters, sort, modal item) shared by every consumer.
//!
//! - **Domain model** ([`model`]): entity kinds, filters and sort state,
//!   plus the Conseil metadata types re-exported from `arronax-api`.

pub mod command;
pub mod config;
pub mod display;
pub mod error;
pub mod explorer;
pub mod export;
pub mod model;
pub mod query;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{CommandResult, ExplorerCommand};
pub use config::{
    DEFAULT_FETCH_LIMIT, DEFAULT_ROW_COUNT, ExplorerConfig, NetworkConfig, TlsVerification,
};
pub use error::CoreError;
pub use explorer::Explorer;
pub use store::{
    AvailableValues, EntityData, ExplorerState, ModalState, StateStore, StoreAction, selectors,
};
pub use stream::StateStream;

pub use model::{
    AttributeDefinition, DataType, EntityKind, Filter, KeyType, Operation, PerEntity, Record,
    Sort, SortDirection, operators_for,
};

// Query and metadata types the CLI builds or prints directly.
pub use arronax_api::{ConseilQuery, EntityDefinition, NetworkDefinition};
