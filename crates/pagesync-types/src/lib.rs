//! Shared types, adapter traits, and error types for pagesync.
//!
//! This crate holds everything the synchronizer engine and the transport
//! adapters have to agree on: the query description, the record shape, the
//! capabilities the engine consumes (page fetching, JSON transport, bearer
//! tokens, boundary triggers) and the error taxonomy.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod boundary;
pub mod error;
pub mod fetcher;
pub mod prelude;
pub mod query;
pub mod record;
pub mod transport;

// vim: ts=4
