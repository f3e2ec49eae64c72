//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod cart;
pub mod cart_line;
pub mod item;
pub mod order;
pub mod review;
pub mod user;
