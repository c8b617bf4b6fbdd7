pub use block::*;
pub use decimal::*;
pub use validator::*;
pub use warden::*;

mod block;
mod decimal;
mod validator;
mod warden;
