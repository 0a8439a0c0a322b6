//! Identity resolution and directory synchronisation for Roster.
//!
//! - [`SchemaProbe`] classifies the directory's identity-modeling
//!   generation once per process.
//! - [`IdentityResolver`] turns an external identity (a JWT subject) into a
//!   canonical [`User`](roster_core::user::User).
//! - [`UserCache`] keeps resolved users keyed by raw identity.
//! - [`ResourceRelationSynchronizer`] mirrors todo ownership into the
//!   directory after the primary store has committed.

mod cache;
mod normalize;
mod probe;
mod resolver;
mod sync;

pub mod error;

pub use cache::UserCache;
pub use error::{Error, Result, SyncError};
pub use normalize::user_from_object;
pub use probe::{PROBE_SENTINEL, SchemaProbe};
pub use resolver::IdentityResolver;
pub use sync::ResourceRelationSynchronizer;
