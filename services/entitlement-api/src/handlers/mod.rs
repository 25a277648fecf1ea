//! REST API handlers

pub mod activation;
pub mod entitlement;
pub mod habits;
pub mod health;
pub mod shared;
pub mod webhook;

pub use activation::*;
pub use entitlement::*;
pub use habits::*;
pub use health::*;
pub use webhook::*;
