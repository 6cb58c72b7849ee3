//! HTTP route handlers for storefront.
//!
//! Every route speaks JSON. Errors are `{"error": "..."}` with a French
//! message.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness
//! GET  /health/ready                 - Readiness (session database)
//!
//! # Catalog
//! GET  /products                     - Active catalog
//! GET  /products/{id}                - Product detail
//! GET  /products/{id}/reviews        - Approved reviews
//! POST /products/{id}/reviews        - Submit a review (auth, backend mode)
//! GET  /categories                   - Categories
//! GET  /search                       - Search, filter and sort
//!
//! # Cart (session)
//! GET  /cart                         - Cart summary
//! GET  /cart/count                   - Item count
//! POST /cart/add                     - Add a product
//! POST /cart/update                  - Set a line's quantity
//! POST /cart/remove                  - Remove a line
//! POST /cart/clear                   - Empty the cart
//!
//! # Checkout (auth)
//! GET  /checkout                     - Current step
//! POST /checkout/shipping            - Step 1 → 2
//! POST /checkout/back                - Step 2 → 1
//! POST /checkout/payment             - Step 2 → 3, places the order
//!
//! # Orders (auth)
//! GET  /orders                       - Order history
//! GET  /orders/{number}              - One order
//! POST /orders/{number}/cancel       - Cancel a pending order
//!
//! # Wishlist and recommendations (auth)
//! GET    /wishlist                   - Saved items, stats
//! POST   /wishlist/{id}              - Toggle a product
//! DELETE /wishlist/{id}              - Remove a product
//! POST   /wishlist/{id}/cart         - Move one item to the cart
//! POST   /wishlist/add-all-to-cart   - Add every in-stock item to the cart
//! GET    /recommendations?tab=       - Recommendations of a tab
//!
//! # Auth
//! GET  /auth/me                      - Current user
//! POST /auth/logout                  - Sign out
//! POST /auth/login                   - Sign in (backend mode)
//! POST /auth/signup                  - Create an account (backend mode)
//! POST /auth/reset-password          - Send a reset email (backend mode)
//! POST /auth/recover                 - Sign in with a reset token (backend mode)
//! POST /auth/demo/admin              - Demo administrator (demo mode)
//! POST /auth/demo/customer           - Demo customer (demo mode)
//!
//! # Account (auth)
//! GET    /account/profile            - Profile
//! PATCH  /account/profile            - Update the profile
//! POST   /account/password           - Change the password (backend mode)
//! GET    /account/addresses          - Saved addresses (backend mode)
//! POST   /account/addresses          - Add an address (backend mode)
//! PATCH  /account/addresses/{id}     - Edit an address (backend mode)
//! DELETE /account/addresses/{id}     - Delete an address (backend mode)
//!
//! # Contact
//! POST /contact                      - Send a message
//!
//! # Admin (admin profile)
//! GET  /admin/dashboard              - Counters and recent orders
//! GET  /admin/orders                 - Orders with search and status filter
//! POST /admin/orders/{id}/status     - Change an order's status
//! GET  /admin/products               - Products with search
//! POST /admin/products               - Create a product
//! PUT  /admin/products/{id}          - Update a product
//! POST /admin/products/{id}/toggle-active - Show or hide a product
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod orders;
pub mod products;
pub mod recommendations;
pub mod search;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::config::AuthMode;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router for `mode`.
pub fn auth_routes(mode: AuthMode, trust_proxy: bool) -> Router<AppState> {
    let common = Router::new()
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout));

    match mode {
        AuthMode::Demo => common
            .route("/demo/admin", post(auth::demo_admin))
            .route("/demo/customer", post(auth::demo_customer)),
        AuthMode::Backend => common.merge(
            Router::new()
                .route("/login", post(auth::login))
                .route("/signup", post(auth::signup))
                .route("/reset-password", post(auth::reset_password))
                .route("/recover", post(auth::recover))
                .route_layer(auth_rate_limiter(trust_proxy)),
        ),
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route(
            "/{id}/reviews",
            get(products::reviews).post(products::create_review),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/shipping", post(checkout::shipping))
        .route("/back", post(checkout::back))
        .route("/payment", post(checkout::payment))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{number}", get(orders::show))
        .route("/{number}/cancel", post(orders::cancel))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/add-all-to-cart", post(wishlist::add_all_to_cart))
        .route("/{id}", post(wishlist::toggle).delete(wishlist::remove))
        .route("/{id}/cart", post(wishlist::add_to_cart))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(account::profile).patch(account::update_profile),
        )
        .route("/password", post(account::update_password))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route(
            "/addresses/{id}",
            axum::routing::patch(account::update_address).delete(account::delete_address),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/orders", get(admin::orders))
        .route("/orders/{id}/status", post(admin::update_order_status))
        .route(
            "/products",
            get(admin::products).post(admin::create_product),
        )
        .route("/products/{id}", axum::routing::put(admin::update_product))
        .route("/products/{id}/toggle-active", post(admin::toggle_product))
}

/// Create all routes for the storefront.
pub fn routes(mode: AuthMode, trust_proxy: bool) -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .route("/categories", get(products::categories))
        .route("/search", get(search::search))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .nest("/wishlist", wishlist_routes())
        .route("/recommendations", get(recommendations::index))
        .nest("/auth", auth_routes(mode, trust_proxy))
        .nest("/account", account_routes())
        .route(
            "/contact",
            post(contact::submit).route_layer(auth_rate_limiter(trust_proxy)),
        )
        .nest("/admin", admin_routes())
}
