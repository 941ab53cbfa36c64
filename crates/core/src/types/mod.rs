//! Core types for Littlewear.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod identity;
pub mod money;
pub mod status;

pub use id::*;
pub use identity::Identity;
pub use money::{effective_price, line_total, round_money};
pub use status::*;
