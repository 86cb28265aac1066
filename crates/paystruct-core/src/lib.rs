//! Core types and pure logic for the PayStruct client.
//!
//! This crate is deliberately free of HTTP and terminal dependencies. It holds
//! the entity records returned by the management API, the derived contract
//! status, the Persian digit and calendar helpers, and the generic
//! filter/sort/join machinery every list screen is built from.

pub mod calendar;
pub mod collection;
pub mod digits;
pub mod entity;
pub mod error;
pub mod expiry;
pub mod form;
pub mod join;
pub mod listing;
pub mod stats;
pub mod wbs;

pub use error::{Error, Result};

#[cfg(test)]
mod fixtures;
