//! Authenticated client for the PayStruct management API.
//!
//! [`ApiClient`] speaks HTTP, [`QueryCache`] holds the last fetched array of
//! each resource, and the [`mutation`] functions write through the client
//! and invalidate the owning cache.

mod cache;
mod client;

pub mod error;
pub mod mutation;
pub mod resource;
pub mod session;

pub use cache::{QueryCache, Snapshot};
pub use client::{ApiClient, AuthGrant};
pub use error::{ClientError, Result};
pub use resource::{Fetchable, Resource};
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};

#[cfg(test)]
mod tests;
