//! User accounts: registration, profile updates and email uniqueness.

pub mod entity;
pub mod error;

pub use error::*;
