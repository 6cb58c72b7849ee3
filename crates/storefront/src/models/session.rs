//! Session-related types.
//!
//! The auth context, cart, wishlist and checkout step of a browser live in
//! its session, which is persisted in the SQLite session store.

/// Session keys.
pub mod keys {
    /// Key for the signed-in user, session and profile.
    pub const AUTH_CONTEXT: &str = "auth_context";

    /// Key for the persisted cart envelope.
    pub const CART: &str = "cart-storage";

    /// Key for the wishlist.
    pub const WISHLIST: &str = "wishlist";

    /// Key for the checkout wizard state.
    pub const CHECKOUT: &str = "checkout";
}
