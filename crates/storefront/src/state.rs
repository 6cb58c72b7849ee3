//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::backend::BackendClient;
use crate::catalog::{Catalog, ProductStore};
use crate::config::{AuthMode, StorefrontConfig};
use crate::orders::OrderBook;
use crate::services::{AuthService, CheckoutService};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Per-browser state (cart, wishlist, auth
/// context) lives in the session, not here.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: SqlitePool,
    backend: BackendClient,
    orders: OrderBook,
    products: ProductStore,
}

impl AppState {
    /// Create the state with the seeded demo order book and product list.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: SqlitePool) -> Self {
        let backend = BackendClient::new(&config.backend);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                backend,
                orders: OrderBook::seeded(),
                products: ProductStore::seeded(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn auth_mode(&self) -> AuthMode {
        self.inner.config.auth_mode
    }

    /// Session database pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// In-memory order book.
    #[must_use]
    pub fn orders(&self) -> &OrderBook {
        &self.inner.orders
    }

    /// In-memory product list edited by the admin panel.
    #[must_use]
    pub fn products(&self) -> &ProductStore {
        &self.inner.products
    }

    /// Catalog reads for the current auth mode.
    #[must_use]
    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(&self.inner.backend, &self.inner.products, self.auth_mode())
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.inner.backend)
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutService<'_> {
        CheckoutService::new(
            &self.inner.backend,
            &self.inner.orders,
            self.auth_mode(),
            self.inner.config.payment_delay,
        )
    }
}
