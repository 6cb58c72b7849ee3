//! Orders and the in-memory order book.
//!
//! The order book is the order store of the demo and the fallback of the
//! backend mode. It is shared by every request and guarded by a `RwLock`;
//! each operation holds the lock only for its own read or write.

mod demo;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lumiere_core::{OrderId, OrderStatus, ProductId, UserId};

use crate::backend::OrderRow;

/// Errors from order book operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("order not found: {0}")]
    NotFound(String),

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("order can no longer be cancelled ({0})")]
    NotCancellable(OrderStatus),
}

/// Where an order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

pub(crate) fn default_country() -> String {
    "France".to_string()
}

/// Who placed the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl CustomerContact {
    fn matches(&self, needle: &str) -> bool {
        [&self.first_name, &self.last_name, &self.email]
            .into_iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub title: String,
    pub author: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub customer: CustomerContact,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Case-insensitive match on order number or customer name/email.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        needle.is_empty()
            || self.order_number.to_lowercase().contains(&needle)
            || self.customer.matches(&needle)
    }

    /// Build an order from a backend row.
    ///
    /// The customer's name is not part of the row; `customer` supplies it.
    #[must_use]
    pub fn from_row(row: OrderRow, customer: CustomerContact) -> Self {
        let items = row
            .order_items
            .into_iter()
            .map(|item| {
                let (title, author) = item
                    .product
                    .map(|p| (p.title, p.author))
                    .unwrap_or_default();
                OrderItem {
                    product_id: item.product_id,
                    title,
                    author,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                }
            })
            .collect::<Vec<_>>();
        let items_total: Decimal = items.iter().map(OrderItem::line_total).sum();
        let shipping_cost = (row.total_amount - items_total).max(Decimal::ZERO);

        Self {
            order_number: row
                .order_number
                .unwrap_or_else(|| format!("CMD-{}", row.id)),
            id: row.id,
            user_id: row.user_id,
            customer: CustomerContact {
                email: row.customer_email.unwrap_or(customer.email),
                ..customer
            },
            status: row.status,
            items,
            shipping_address: row.shipping_address.unwrap_or_else(|| ShippingAddress {
                street: String::new(),
                city: String::new(),
                postal_code: String::new(),
                country: default_country(),
            }),
            shipping_cost,
            total_amount: row.total_amount,
            updated_at: row.updated_at.unwrap_or(row.created_at),
            created_at: row.created_at,
        }
    }
}

/// An order as shown to customers, with its status label and message.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub status_label: &'static str,
    pub status_message: &'static str,
    pub can_cancel: bool,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            status_label: order.status.label(),
            status_message: order.status.message(),
            can_cancel: order.status.is_cancellable_by_customer(),
            order,
        }
    }
}

/// Everything needed to record a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub user_id: UserId,
    pub customer: CustomerContact,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub shipping_cost: Decimal,
}

impl NewOrder {
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.items.iter().map(OrderItem::line_total).sum::<Decimal>() + self.shipping_cost
    }
}

/// In-memory order store shared by all requests.
pub struct OrderBook {
    inner: RwLock<OrderBookInner>,
}

struct OrderBookInner {
    orders: Vec<Order>,
    next_id: i32,
}

impl OrderBook {
    #[must_use]
    pub fn new(orders: Vec<Order>) -> Self {
        let next_id = orders.iter().map(|o| o.id.as_i32()).max().unwrap_or(0) + 1;
        Self {
            inner: RwLock::new(OrderBookInner { orders, next_id }),
        }
    }

    /// Order book pre-filled with the demo orders.
    #[must_use]
    pub fn seeded() -> Self {
        Self::new(demo::orders())
    }

    fn read(&self) -> RwLockReadGuard<'_, OrderBookInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, OrderBookInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a new pending order.
    pub fn insert(&self, new: NewOrder, now: DateTime<Utc>) -> Order {
        let mut inner = self.write();
        let id = OrderId::new(inner.next_id);
        inner.next_id += 1;

        let order = Order {
            id,
            total_amount: new.total_amount(),
            order_number: new.order_number,
            user_id: new.user_id,
            customer: new.customer,
            status: OrderStatus::Pending,
            items: new.items,
            shipping_address: new.shipping_address,
            shipping_cost: new.shipping_cost,
            created_at: now,
            updated_at: now,
        };
        inner.orders.push(order.clone());
        order
    }

    /// Every order, newest first.
    #[must_use]
    pub fn all(&self) -> Vec<Order> {
        let mut orders = self.read().orders.clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// One user's orders, newest first.
    #[must_use]
    pub fn for_user(&self, user_id: &UserId) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .read()
            .orders
            .iter()
            .filter(|o| &o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// One of a user's orders by number.
    #[must_use]
    pub fn find_for_user(&self, user_id: &UserId, order_number: &str) -> Option<Order> {
        self.read()
            .orders
            .iter()
            .find(|o| &o.user_id == user_id && o.order_number == order_number)
            .cloned()
    }

    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<Order> {
        self.read().orders.iter().find(|o| o.id == id).cloned()
    }

    /// Move an order to `status` if the lifecycle allows it.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` for an unknown id and
    /// `OrderError::InvalidTransition` for a move the lifecycle forbids.
    pub fn set_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        let mut inner = self.write();
        let order = inner
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| OrderError::NotFound(id.to_string()))?;

        if !order.status.can_transition_to(status) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: status,
            });
        }

        order.status = status;
        order.updated_at = now;
        Ok(order.clone())
    }

    /// Cancel one of the user's own orders while it is still pending.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the user has no such order and
    /// `OrderError::NotCancellable` once processing has started.
    pub fn cancel(
        &self,
        user_id: &UserId,
        order_number: &str,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        let mut inner = self.write();
        let order = inner
            .orders
            .iter_mut()
            .find(|o| &o.user_id == user_id && o.order_number == order_number)
            .ok_or_else(|| OrderError::NotFound(order_number.to_string()))?;

        if !order.status.is_cancellable_by_customer() {
            return Err(OrderError::NotCancellable(order.status));
        }

        order.status = OrderStatus::Cancelled;
        order.updated_at = now;
        Ok(order.clone())
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
