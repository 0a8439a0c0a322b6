//! Core types and trait definitions for Roster.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! describes the external collaborators the identity core talks to: the
//! relationship-graph [`directory::Directory`], the primary
//! [`store::TodoStore`] and the policy [`authz::Authorizer`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod authz;
pub mod directory;
pub mod schema;
pub mod store;
pub mod todo;
pub mod user;
