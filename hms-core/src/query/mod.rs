//! Resource query cache.
//!
//! Reads are mounted through [`QueryClient::query`] and cached under a
//! [`CacheKey`]. Concurrent reads of one key share a single request, and
//! every response envelope is stripped before data reaches a consumer.
//! Writes go through [`Mutation`], which invalidates its keys on success so
//! mounted reads of the affected resource refetch.

mod client;
mod envelope;
mod error;
mod key;
mod mutation;
mod observer;

pub use client::{CacheConfig, QueryClient};
pub use envelope::Envelope;
pub use error::QueryError;
pub use key::CacheKey;
pub use mutation::{Mutation, MutationState, MutationStatus};
pub use observer::{Query, QueryOptions, QueryState, QueryStatus, Select};
