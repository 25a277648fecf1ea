//! Tally Types - Shared domain types
//!
//! This crate contains domain types used across Tally services:
//! - User identity
//! - Plan tiers and the account plan record
//! - Redeemable codes and activation outcomes
//! - Gated features

pub mod account;
pub mod code;
pub mod feature;
pub mod plan;
pub mod user;

pub use account::*;
pub use code::*;
pub use feature::*;
pub use plan::*;
pub use user::*;
