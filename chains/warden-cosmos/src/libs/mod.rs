pub use account::*;

mod account;
