//! Domain layer - Core marketplace entities and rules
//!
//! Entities, value objects and the pure rules that govern them
//! (cart arithmetic, order lifecycle, review policy, secret hashing).
//! Nothing in here touches storage or HTTP.

pub mod cart;
pub mod chat;
pub mod item;
pub mod order;
pub mod otp;
pub mod password;
pub mod review;
pub mod secret;
pub mod user;

pub use cart::{Cart, CartLine, CartLineView, CartView};
pub use chat::{ChatMessage, ChatPrompt, ChatReply, ChatRequest, ChatRole, ModelRole, ModelTurn};
pub use item::{Item, ItemDetail, ItemRef, ItemResponse, ItemSearch, NewItem};
pub use order::{
    CheckoutReceipt, NewOrder, Order, OrderItemView, OrderParty, OrderQuery, OrderStatus,
    OrderView, VerifyCodeRequest,
};
pub use otp::OneTimeCode;
pub use password::Password;
pub use review::{NewReview, Review, ReviewInput, ReviewList, ReviewView};
pub use secret::SecretHash;
pub use user::{
    normalize_institutional_email, NewUser, PartySummary, ProfileUpdate, PublicProfile, User,
    UserResponse,
};
