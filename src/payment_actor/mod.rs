//! Payments: capture, failure and refunds against a captured balance.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
