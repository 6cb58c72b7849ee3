//! Checkout wizard.
//!
//! Three steps: shipping (1), payment (2), confirmation (3). The wizard
//! state lives in the browser session; payment details are only held for
//! the duration of the request that submits them.

use std::time::Duration;

use chrono::{Datelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use lumiere_core::OrderId;

use crate::backend::{BackendClient, CreateOrderParams, NewOrderItem};
use crate::cart::{CartStorage, CartStorageError, CartStore, CartSummary, SHIPPING_COST};
use crate::config::AuthMode;
use crate::models::session_keys;
use crate::orders::{CustomerContact, NewOrder, OrderBook, OrderItem, ShippingAddress, default_country};
use crate::services::auth::AuthContext;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Vous devez être connecté pour passer commande")]
    NotConnected,

    #[error("Votre panier est vide")]
    EmptyCart,

    #[error("Veuillez remplir tous les champs obligatoires")]
    MissingShippingFields,

    #[error("Veuillez remplir toutes les informations de paiement")]
    MissingPaymentFields,

    #[error("Étape de commande invalide: attendu {expected:?}, actuel {actual:?}")]
    InvalidStep {
        expected: CheckoutStep,
        actual: CheckoutStep,
    },

    #[error("cart error: {0}")]
    Cart(#[from] CartStorageError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Shipping,
    Payment,
    Confirmation,
}

impl CheckoutStep {
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Shipping => 1,
            Self::Payment => 2,
            Self::Confirmation => 3,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Shipping => "Livraison",
            Self::Payment => "Paiement",
            Self::Confirmation => "Confirmation",
        }
    }
}

/// Step 1 form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

impl Default for ShippingInfo {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            street: String::new(),
            city: String::new(),
            postal_code: String::new(),
            country: default_country(),
        }
    }
}

impl ShippingInfo {
    /// Form pre-filled with the user's name and email.
    #[must_use]
    pub fn prefilled(ctx: &AuthContext) -> Self {
        let profile = ctx.profile.as_ref();
        Self {
            first_name: profile
                .and_then(|p| p.first_name.clone())
                .unwrap_or_default(),
            last_name: profile
                .and_then(|p| p.last_name.clone())
                .unwrap_or_default(),
            email: ctx
                .user
                .as_ref()
                .and_then(|u| u.email.clone())
                .unwrap_or_default(),
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns `CheckoutError::MissingShippingFields` if a required field is blank.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let required = [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.street,
            &self.city,
            &self.postal_code,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(CheckoutError::MissingShippingFields);
        }
        Ok(())
    }

    #[must_use]
    pub fn address(&self) -> ShippingAddress {
        let country = self.country.trim();
        ShippingAddress {
            street: self.street.trim().to_string(),
            city: self.city.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: if country.is_empty() {
                default_country()
            } else {
                country.to_string()
            },
        }
    }

    #[must_use]
    pub fn contact(&self) -> CustomerContact {
        CustomerContact {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }
}

/// Step 2 form.
///
/// Implements `Debug` manually so card data never reaches the logs.
#[derive(Clone, Deserialize)]
pub struct PaymentInfo {
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub expiry_date: String,
    #[serde(default)]
    pub cvv: String,
    #[serde(default)]
    pub card_name: String,
}

impl std::fmt::Debug for PaymentInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentInfo")
            .field("card_number", &"[REDACTED]")
            .field("expiry_date", &"[REDACTED]")
            .field("cvv", &"[REDACTED]")
            .field("card_name", &"[REDACTED]")
            .finish()
    }
}

impl PaymentInfo {
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingPaymentFields` if a field is blank.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let fields = [&self.card_number, &self.expiry_date, &self.cvv, &self.card_name];
        if fields.iter().any(|field| field.trim().is_empty()) {
            return Err(CheckoutError::MissingPaymentFields);
        }
        Ok(())
    }
}

/// Wizard state kept in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutState {
    pub step: CheckoutStep,
    pub shipping: ShippingInfo,
    #[serde(default)]
    pub order_number: Option<String>,
}

impl CheckoutState {
    /// A fresh wizard at step 1.
    #[must_use]
    pub fn start(ctx: &AuthContext) -> Self {
        Self {
            step: CheckoutStep::Shipping,
            shipping: ShippingInfo::prefilled(ctx),
            order_number: None,
        }
    }

    fn expect_step(&self, expected: CheckoutStep) -> Result<(), CheckoutError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(CheckoutError::InvalidStep {
                expected,
                actual: self.step,
            })
        }
    }

    /// Step 1 → 2.
    ///
    /// # Errors
    ///
    /// Returns `MissingShippingFields` for an incomplete form and
    /// `InvalidStep` once the order is confirmed.
    pub fn submit_shipping(&mut self, info: ShippingInfo) -> Result<(), CheckoutError> {
        if self.step == CheckoutStep::Confirmation {
            return Err(CheckoutError::InvalidStep {
                expected: CheckoutStep::Shipping,
                actual: self.step,
            });
        }
        info.validate()?;
        self.shipping = info;
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    /// Step 2 → 1.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStep` unless the wizard is at the payment step.
    pub fn back(&mut self) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Payment)?;
        self.step = CheckoutStep::Shipping;
        Ok(())
    }

    /// The stored wizard, or `None` if checkout was never started.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn load(session: &Session) -> Result<Option<Self>, CheckoutError> {
        Ok(session.get::<Self>(session_keys::CHECKOUT).await?)
    }

    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save(&self, session: &Session) -> Result<(), CheckoutError> {
        session.insert(session_keys::CHECKOUT, self).await?;
        Ok(())
    }
}

/// What the client sees at each step.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutView {
    pub step: CheckoutStep,
    pub step_number: u8,
    pub step_title: &'static str,
    pub shipping: ShippingInfo,
    pub order_number: Option<String>,
    pub cart: CartSummary,
}

impl CheckoutView {
    #[must_use]
    pub fn new(state: &CheckoutState, cart: CartSummary) -> Self {
        Self {
            step: state.step,
            step_number: state.step.number(),
            step_title: state.step.title(),
            shipping: state.shipping.clone(),
            order_number: state.order_number.clone(),
            cart,
        }
    }
}

/// Result of a successful payment step.
#[derive(Debug, Clone, Serialize)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub order_number: String,
    pub total: rust_decimal::Decimal,
    pub item_count: u64,
}

/// `CMD-<year>-<4 digits>`.
#[must_use]
pub fn generate_order_number(year: i32, rng: &mut impl Rng) -> String {
    format!("CMD-{year}-{:04}", rng.random_range(0..10_000))
}

/// Places orders at the end of the wizard.
pub struct CheckoutService<'a> {
    backend: &'a BackendClient,
    orders: &'a OrderBook,
    mode: AuthMode,
    payment_delay: Duration,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(
        backend: &'a BackendClient,
        orders: &'a OrderBook,
        mode: AuthMode,
        payment_delay: Duration,
    ) -> Self {
        Self {
            backend,
            orders,
            mode,
            payment_delay,
        }
    }

    /// Step 2 → 3: take payment, record the order and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected`, `EmptyCart`, `InvalidStep` or
    /// `MissingPaymentFields` before anything is recorded, and `Cart` if the
    /// emptied cart cannot be persisted.
    #[instrument(skip_all, fields(user_id = ?ctx.user_id()))]
    pub async fn place_order<S: CartStorage + Sync>(
        &self,
        ctx: &AuthContext,
        state: &mut CheckoutState,
        cart: &mut CartStore<S>,
        payment: &PaymentInfo,
    ) -> Result<OrderConfirmation, CheckoutError> {
        let user_id = ctx
            .user_id()
            .filter(|_| ctx.is_authenticated())
            .cloned()
            .ok_or(CheckoutError::NotConnected)?;
        if cart.cart().is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        state.expect_step(CheckoutStep::Payment)?;
        payment.validate()?;

        // Stand-in for a payment provider round trip
        tokio::time::sleep(self.payment_delay).await;

        let order_number = {
            let mut rng = rand::rng();
            generate_order_number(Utc::now().year(), &mut rng)
        };
        let new_order = NewOrder {
            order_number: order_number.clone(),
            user_id,
            customer: state.shipping.contact(),
            items: cart
                .cart()
                .items()
                .iter()
                .map(|item| OrderItem {
                    product_id: item.id,
                    title: item.title.clone(),
                    author: item.author.clone(),
                    quantity: item.quantity,
                    unit_price: item.price,
                })
                .collect(),
            shipping_address: state.shipping.address(),
            shipping_cost: SHIPPING_COST,
        };
        let total = new_order.total_amount();
        let item_count = cart.total_items();

        let order_id = self.record(ctx, new_order).await;
        cart.clear().await?;

        state.step = CheckoutStep::Confirmation;
        state.order_number = Some(order_number.clone());
        info!(order_number = %order_number, total = %total, "Order placed");

        Ok(OrderConfirmation {
            order_id,
            order_number,
            total,
            item_count,
        })
    }

    /// Record through the backend RPC when possible, else in the order book.
    async fn record(&self, ctx: &AuthContext, order: NewOrder) -> OrderId {
        if !self.mode.is_demo()
            && let Some(session) = &ctx.session
        {
            let params = CreateOrderParams {
                order_number: order.order_number.clone(),
                user_id: order.user_id.clone(),
                customer_email: order.customer.email.clone(),
                items: order
                    .items
                    .iter()
                    .map(|item| NewOrderItem {
                        product_id: item.product_id,
                        quantity: item.quantity,
                        unit_price: item.unit_price,
                    })
                    .collect(),
                shipping_address: order.shipping_address.clone(),
                shipping_cost: order.shipping_cost,
                total_amount: order.total_amount(),
            };
            match self.backend.create_order(&params, session).await {
                Ok(id) => return id,
                Err(e) => warn!(error = %e, "Backend order creation failed, keeping order locally"),
            }
        }

        self.orders.insert(order, Utc::now()).id
    }
}
