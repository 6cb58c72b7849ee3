//! Persisted shopping cart.
//!
//! [`CartStore`] wraps the [`Cart`] reducer from `lumiere-core` and writes
//! the cart through a [`CartStorage`] adapter after every mutation. The
//! persisted value is an envelope of the form
//! `{"state":{"items":[...]},"version":0}` stored under the `cart-storage`
//! key. Unreadable data is logged and replaced by an empty cart; there is no
//! migration between versions.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tower_sessions::Session;
use tracing::warn;

use lumiere_core::{Cart, CartLineItem, CartProduct, ProductId};

use crate::models::session_keys;

/// Flat shipping cost of a non-empty cart (€4.90).
pub const SHIPPING_COST: Decimal = Decimal::from_parts(490, 0, 0, false, 2);

/// Version written into the persisted envelope.
const STORAGE_VERSION: u32 = 0;

#[derive(Debug, Error)]
pub enum CartStorageError {
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("cart serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where a cart is persisted between requests.
pub trait CartStorage {
    /// Read the raw persisted value, if any.
    fn load_raw(&self) -> impl Future<Output = Result<Option<Value>, CartStorageError>> + Send;

    /// Replace the persisted value.
    fn save_raw(&self, value: Value) -> impl Future<Output = Result<(), CartStorageError>> + Send;
}

/// Cart persisted in the browser session.
#[derive(Clone)]
pub struct SessionCartStorage {
    session: Session,
}

impl SessionCartStorage {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl CartStorage for SessionCartStorage {
    async fn load_raw(&self) -> Result<Option<Value>, CartStorageError> {
        Ok(self.session.get::<Value>(session_keys::CART).await?)
    }

    async fn save_raw(&self, value: Value) -> Result<(), CartStorageError> {
        self.session.insert(session_keys::CART, value).await?;
        Ok(())
    }
}

/// Cart persisted in memory as a JSON string; used in tests.
#[derive(Debug, Default)]
pub struct MemoryCartStorage {
    raw: Mutex<Option<String>>,
}

impl MemoryCartStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with `raw`, as if written by an earlier session.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    /// The persisted JSON text.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.raw
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T: CartStorage + Sync> CartStorage for &T {
    fn load_raw(&self) -> impl Future<Output = Result<Option<Value>, CartStorageError>> + Send {
        (**self).load_raw()
    }

    fn save_raw(&self, value: Value) -> impl Future<Output = Result<(), CartStorageError>> + Send {
        (**self).save_raw(value)
    }
}

impl CartStorage for MemoryCartStorage {
    async fn load_raw(&self) -> Result<Option<Value>, CartStorageError> {
        self.raw()
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(CartStorageError::from)
    }

    async fn save_raw(&self, value: Value) -> Result<(), CartStorageError> {
        let raw = serde_json::to_string(&value)?;
        *self.raw.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw);
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedCart<C> {
    state: C,
    #[serde(default)]
    version: u32,
}

/// A cart bound to its storage.
pub struct CartStore<S> {
    storage: S,
    cart: Cart,
}

impl<S: CartStorage + Sync> CartStore<S> {
    /// Load the cart from `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage itself cannot be read. Malformed
    /// cart data is not an error: it is logged and yields an empty cart.
    pub async fn open(storage: S) -> Result<Self, CartStorageError> {
        let cart = match storage.load_raw().await? {
            None => Cart::new(),
            Some(raw) => match serde_json::from_value::<PersistedCart<Cart>>(raw) {
                Ok(persisted) => persisted.state.normalized(),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable persisted cart");
                    Cart::new()
                }
            },
        };

        Ok(Self { storage, cart })
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    async fn persist(&self) -> Result<(), CartStorageError> {
        let envelope = PersistedCart {
            state: &self.cart,
            version: STORAGE_VERSION,
        };
        self.storage.save_raw(serde_json::to_value(envelope)?).await
    }

    /// Add `quantity` units of `product`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub async fn add_item(
        &mut self,
        product: CartProduct,
        quantity: u32,
    ) -> Result<(), CartStorageError> {
        self.cart.add_item(product, quantity);
        self.persist().await
    }

    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub async fn remove_item(&mut self, id: ProductId) -> Result<(), CartStorageError> {
        self.cart.remove_item(id);
        self.persist().await
    }

    /// Set a line's quantity; zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub async fn update_quantity(
        &mut self,
        id: ProductId,
        quantity: i64,
    ) -> Result<(), CartStorageError> {
        self.cart.update_quantity(id, quantity);
        self.persist().await
    }

    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub async fn clear(&mut self) -> Result<(), CartStorageError> {
        self.cart.clear();
        self.persist().await
    }

    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.cart.total_items()
    }

    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.cart.total_price()
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary::from(&self.cart)
    }
}

/// A cart line with its computed total.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub item: CartLineItem,
    pub line_total: Decimal,
}

/// The cart as shown on the cart page.
#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartLineView>,
    pub total_items: u64,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl From<&Cart> for CartSummary {
    fn from(cart: &Cart) -> Self {
        let subtotal = cart.total_price();
        let shipping = if cart.is_empty() {
            Decimal::ZERO
        } else {
            SHIPPING_COST
        };

        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartLineView {
                    line_total: item.line_total(),
                    item: item.clone(),
                })
                .collect(),
            total_items: cart.total_items(),
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }
}
