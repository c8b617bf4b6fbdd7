pub use base_server::*;

mod base_server;
