//! JSON over HTTP helpers shared by the third-party collectors.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod error;
mod eth;
mod headers;

pub use client::*;
pub use error::*;
pub use eth::*;
pub use headers::*;
