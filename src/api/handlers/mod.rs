//! HTTP request handlers.

pub mod auth_handler;
pub mod cart_handler;
pub mod chat_handler;
pub mod health_handler;
pub mod item_handler;
pub mod order_handler;
pub mod review_handler;
pub mod user_handler;

pub use auth_handler::auth_routes;
pub use cart_handler::cart_routes;
pub use chat_handler::chat_routes;
pub use health_handler::{health, root};
pub use item_handler::item_routes;
pub use order_handler::order_routes;
pub use review_handler::review_routes;
pub use user_handler::user_routes;
