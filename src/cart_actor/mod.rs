//! One shopping cart per user, edited through actions.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
