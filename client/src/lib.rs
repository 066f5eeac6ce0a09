//! Client for the X account link and the BNB-fee staking contract.
//!
//! The library is transport-agnostic at its seams: controllers talk to
//! [`contracts::ContractReader`], [`contracts::ContractWriter`],
//! [`services::SocialApi`] and [`services::StakeLogStore`], with JSON-RPC and
//! HTTP implementations provided alongside.

pub mod config;
pub mod contracts;
pub mod controllers;
pub mod error;
pub mod instructions;
pub mod notify;
pub mod services;
pub mod states;
pub mod units;

pub use error::{ClientError, Result};
