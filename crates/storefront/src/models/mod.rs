//! Domain models for storefront.
//!
//! Models that map 1:1 onto their table derive `sqlx::FromRow` directly;
//! the ones that need parsing (status strings, JSONB addresses) are built
//! from row structs in the corresponding `db` module.

pub mod cart;
pub mod coupon;
pub mod order;
pub mod product;
pub mod review;

pub use cart::{CartLine, CartLineView, CartSummary};
pub use coupon::Coupon;
pub use order::{Address, Order, OrderLine, OrderWithItems};
pub use product::{Category, Product};
pub use review::Review;
