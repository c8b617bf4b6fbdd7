//! Warden chain access over Cosmos-SDK gRPC.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod libs;
mod providers;
mod trait_builder;
/// Warden custom module queries
pub mod warden;

pub use self::{error::*, libs::*, providers::*, trait_builder::*};
