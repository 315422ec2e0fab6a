//! Catalog categories, unique by slug.

pub mod entity;
pub mod error;

pub use error::*;
