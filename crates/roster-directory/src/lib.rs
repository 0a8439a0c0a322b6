//! Clients for the external services Roster consumes.
//!
//! - [`InMemoryDirectory`] keeps the whole graph in process and enforces a
//!   [`RelationModel`], so it answers `InvalidArgument` the same way a real
//!   directory does for relations its model does not define.
//! - [`HttpDirectory`] talks to a directory service's JSON gateway.
//! - [`HttpAuthorizer`] asks an external authorizer for decisions;
//!   [`PermitAll`] stands in for it during development.

mod authorizer;
mod http;
mod memory;

pub use authorizer::{HttpAuthorizer, HttpAuthorizerConfig, PermitAll};
pub use http::{HttpDirectory, HttpDirectoryConfig};
pub use memory::{InMemoryDirectory, RelationModel};
