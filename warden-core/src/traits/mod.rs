pub use bank::*;
pub use block::*;
pub use staking::*;
pub use warden::*;

mod bank;
mod block;
mod staking;
mod warden;
