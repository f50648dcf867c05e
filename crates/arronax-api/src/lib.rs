// arronax-api: Async Rust client for the Conseil indexer API (metadata + data)

pub mod client;
pub mod error;
pub mod metadata;
pub mod query;
pub mod transport;

pub use client::{ConseilClient, Record};
pub use error::Error;
pub use metadata::{
    AttributeDefinition, DataType, EntityDefinition, KeyType, NetworkDefinition,
    PlatformDefinition,
};
pub use query::{
    AggregationFunction, ConseilQuery, DEFAULT_LIMIT, Operation, OutputType, Predicate,
    SortDirection,
};
pub use transport::{TlsMode, TransportConfig};
