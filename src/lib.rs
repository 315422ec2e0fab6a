//! Storefront core: catalog, carts, checkout, the order lifecycle and
//! payment/refund orchestration, each resource owned by its own actor.

pub mod actor_framework;
pub mod app_system;
pub mod cart_actor;
pub mod category_actor;
pub mod cli;
pub mod clients;
pub mod config;
pub mod domain;
pub mod error;
pub mod order_actor;
pub mod payment_actor;
pub mod product_actor;
pub mod user_actor;
pub mod validation;
pub mod webhooks;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod mock_framework;

pub use app_system::{setup_tracing, StoreSystem, Verbosity};
pub use config::Config;
pub use error::{HttpStatus, StoreError};
