// ── Domain model ──
//
// Entity kinds, filter predicates and sort state. Records themselves stay
// untyped (`arronax_api::Record`) since their shape comes from the server.

mod entity;
mod filter;

pub use entity::{EntityKind, PerEntity};
pub use filter::{Filter, Sort, operators_for};

pub use arronax_api::{AttributeDefinition, DataType, KeyType, Operation, Record, SortDirection};
