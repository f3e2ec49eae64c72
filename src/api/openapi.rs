//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    auth_handler, cart_handler, chat_handler, health_handler, item_handler, order_handler,
    review_handler, user_handler,
};
use crate::domain::{
    CartLineView, CartView, ChatMessage, ChatReply, ChatRequest, ChatRole, CheckoutReceipt,
    ItemDetail, ItemRef, ItemResponse, OrderItemView, OrderStatus, OrderView, PartySummary,
    ProfileUpdate, PublicProfile, ReviewInput, ReviewList, ReviewView, UserResponse,
    VerifyCodeRequest,
};
use crate::services::TokenResponse;
use crate::types::MessageResponse;

/// OpenAPI documentation for the Campus Market API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Campus Market API",
        version = "0.1.0",
        description = "Buy-sell marketplace for a university community with one-time-code handoff",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        health_handler::health,
        // Authentication endpoints
        auth_handler::register,
        auth_handler::login,
        // User endpoints
        user_handler::get_current_user,
        user_handler::update_current_user,
        user_handler::change_password,
        user_handler::get_user,
        // Catalog endpoints
        item_handler::create_item,
        item_handler::list_my_items,
        item_handler::search_items,
        item_handler::get_item,
        item_handler::delete_item,
        // Cart endpoints
        cart_handler::get_cart,
        cart_handler::add_to_cart,
        cart_handler::set_quantity,
        cart_handler::remove_from_cart,
        cart_handler::checkout,
        // Order endpoints
        order_handler::pending_purchases,
        order_handler::purchases,
        order_handler::sales,
        order_handler::pending_deliveries,
        order_handler::verify_order,
        // Review endpoints
        review_handler::list_seller_reviews,
        review_handler::add_review,
        // Chat
        chat_handler::chat,
    ),
    components(
        schemas(
            // Domain types
            UserResponse,
            PublicProfile,
            PartySummary,
            ProfileUpdate,
            ItemResponse,
            ItemDetail,
            ItemRef,
            CartView,
            CartLineView,
            CheckoutReceipt,
            OrderStatus,
            OrderView,
            OrderItemView,
            VerifyCodeRequest,
            ReviewInput,
            ReviewView,
            ReviewList,
            ChatRole,
            ChatMessage,
            ChatRequest,
            ChatReply,
            // Request and response types
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            TokenResponse,
            user_handler::ChangePasswordRequest,
            item_handler::CreateItemRequest,
            cart_handler::QuantityRequest,
            health_handler::HealthResponse,
            health_handler::ServiceHealth,
            health_handler::ServiceStatus,
            MessageResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Dependency health"),
        (name = "Authentication", description = "User registration and login"),
        (name = "Users", description = "Profiles"),
        (name = "Items", description = "Listings and search"),
        (name = "Cart", description = "Cart editing and checkout"),
        (name = "Orders", description = "Order history and handoff verification"),
        (name = "Reviews", description = "Seller ratings"),
        (name = "Chat", description = "Marketplace assistant")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}
