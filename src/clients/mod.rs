//! Typed clients for the resource actors.
//!
//! Each client wraps a `ResourceClient` and adds validation plus any
//! workflow that spans several actors.

#[macro_use]
pub mod macros;
pub mod cart_client;
pub mod category_client;
pub mod order_client;
pub mod payment_client;
pub mod product_client;
pub mod user_client;

pub use cart_client::*;
pub use category_client::*;
pub use order_client::*;
pub use payment_client::*;
pub use product_client::*;
pub use user_client::*;
