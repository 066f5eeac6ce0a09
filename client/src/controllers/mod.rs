pub mod social_link;
pub mod staking;

pub use social_link::*;
pub use staking::*;
