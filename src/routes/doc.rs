use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        favorites::{FavoriteProductList, ToggleFavoriteResponse},
        follows::{FollowedStoreList, ToggleFollowResponse},
        notifications::NotificationList,
        orders::{OrderList, PlaceOrderRequest, UpdateOrderStatusRequest},
        products::{CreateProductRequest, ProductDetail, ProductList, UpdateProductRequest},
        reviews::{ProductRating, RespondReviewRequest, ReviewList, SubmitReviewRequest},
        stores::CreateStoreRequest,
    },
    models::{Favorite, Notification, Order, Product, Review, Store, StoreFollow, User},
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, favorites, follows, health, notifications, orders, params, products, reviews,
        stores,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        stores::create_store,
        stores::my_store,
        stores::get_store,
        products::list_products,
        products::get_product,
        products::my_products,
        products::create_product,
        products::update_product,
        products::delete_product,
        orders::place_order,
        orders::list_orders,
        orders::list_store_orders,
        orders::cancel_order,
        orders::set_order_status,
        reviews::submit_review,
        reviews::list_product_reviews,
        reviews::product_rating,
        reviews::respond_to_review,
        favorites::toggle_favorite,
        favorites::list_favorites,
        follows::toggle_follow,
        follows::list_followed_stores,
        notifications::list_notifications,
        admin::list_pending_reviews,
        admin::approve_review,
        admin::hide_review
    ),
    components(
        schemas(
            User,
            Store,
            Product,
            Order,
            Review,
            Notification,
            Favorite,
            StoreFollow,
            CreateStoreRequest,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            ProductDetail,
            PlaceOrderRequest,
            UpdateOrderStatusRequest,
            OrderList,
            SubmitReviewRequest,
            RespondReviewRequest,
            ReviewList,
            ProductRating,
            ToggleFavoriteResponse,
            FavoriteProductList,
            ToggleFollowResponse,
            FollowedStoreList,
            NotificationList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<ProductDetail>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<ReviewList>,
            ApiResponse<NotificationList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Stores", description = "Store endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Orders", description = "Order lifecycle endpoints"),
        (name = "Reviews", description = "Review endpoints"),
        (name = "Favorites", description = "Favorite endpoints"),
        (name = "Follows", description = "Store follow endpoints"),
        (name = "Notifications", description = "Notification endpoints"),
        (name = "Admin", description = "Moderation endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
