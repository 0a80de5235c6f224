//! Core types, configuration, and alias routing for bucketgate.
//!
//! This crate holds everything the gateway needs to decide *what* a request
//! refers to, independent of how objects are fetched or how HTTP is served:
//!
//! - [`GatewayConfig`]: environment and file driven configuration.
//! - [`AliasTable`]: the validated, immutable alias to bucket mapping.
//! - [`AliasRouter`]: maps a request path to a `(bucket, key)` pair.

mod alias;
mod config;
mod error;

pub use alias::{AliasRouter, AliasTable, ObjectRoute, derive_object_key, replace_empty_base};
pub use config::{DEFAULT_INDEX_DOCUMENT, GatewayConfig, StorageBackend, parse_alias_list};
pub use error::{GatewayError, GatewayResult};
