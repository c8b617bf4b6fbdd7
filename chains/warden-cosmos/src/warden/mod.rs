pub use query_client::*;

/// Hand written messages for the Warden custom modules
pub mod proto;
mod query_client;
