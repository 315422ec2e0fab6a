//! Orders and their status state machine.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use entity::ensure_transition;
pub use error::*;
