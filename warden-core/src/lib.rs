//! Core primitives, traits, and types shared by the Warden exporter crates.
//!
//! Nothing in here talks to the network. Upstream access is described by the
//! provider traits in [`traits`], and the chain crates implement them.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use error::*;
pub use traits::*;
pub use types::*;

mod error;
/// Provider traits implemented by upstream clients
pub mod traits;
/// Domain types
pub mod types;
