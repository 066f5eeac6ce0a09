pub mod social_account;
pub mod stake_log;
pub mod user_staking_data;
pub mod wallet_state;

pub use social_account::*;
pub use stake_log::*;
pub use user_staking_data::*;
pub use wallet_state::*;
