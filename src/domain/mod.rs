pub mod address;
pub mod cart;
pub mod category;
pub mod money;
pub mod order;
pub mod payment;
pub mod pricing;
pub mod product;
pub mod user;

pub use address::*;
pub use cart::*;
pub use category::*;
pub use money::*;
pub use order::*;
pub use payment::*;
pub use pricing::*;
pub use product::*;
pub use user::*;
