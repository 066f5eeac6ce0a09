pub mod social_api;
pub mod stake_logs;

pub use social_api::*;
pub use stake_logs::*;
