//! Admin panel: dashboard, order management and product management.
//!
//! Everything here works on the shared in-memory [`OrderBook`] and
//! [`ProductStore`]. Access control lives in the route layer
//! (`RequireAdmin`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use lumiere_core::{OrderId, OrderStatus, ProductId};

use crate::catalog::{Product, ProductDraft, ProductStore, StockStatus};
use crate::orders::{Order, OrderBook, OrderError, OrderView};
use crate::validation::ValidationError;

/// Orders shown on the dashboard.
const RECENT_ORDERS: usize = 5;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("produit introuvable: {0}")]
    ProductNotFound(ProductId),
}

// =============================================================================
// Dashboard
// =============================================================================

/// Order counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub shipped: usize,
    pub delivered: usize,
    pub cancelled: usize,
}

impl OrderStats {
    #[must_use]
    pub fn of(orders: &[Order]) -> Self {
        let mut stats = Self {
            total: orders.len(),
            ..Self::default()
        };
        for order in orders {
            match order.status {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Processing => stats.processing += 1,
                OrderStatus::Shipped => stats.shipped += 1,
                OrderStatus::Delivered => stats.delivered += 1,
                OrderStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub orders: OrderStats,
    /// Sum of every order that was not cancelled.
    pub revenue: Decimal,
    pub active_products: usize,
    pub low_stock_products: usize,
    pub out_of_stock_products: usize,
    pub recent_orders: Vec<OrderView>,
}

impl Dashboard {
    #[must_use]
    pub fn build(orders: &OrderBook, products: &ProductStore) -> Self {
        let all_orders = orders.all();
        let all_products = products.all();

        let revenue: Decimal = all_orders
            .iter()
            .filter(|o| o.status != OrderStatus::Cancelled)
            .map(|o| o.total_amount)
            .sum();
        let count_stock = |status: StockStatus| {
            all_products
                .iter()
                .filter(|p| p.stock_status() == status)
                .count()
        };

        Self {
            orders: OrderStats::of(&all_orders),
            revenue,
            active_products: all_products.iter().filter(|p| p.is_active).count(),
            low_stock_products: count_stock(StockStatus::Low),
            out_of_stock_products: count_stock(StockStatus::OutOfStock),
            recent_orders: all_orders
                .into_iter()
                .take(RECENT_ORDERS)
                .map(OrderView::from)
                .collect(),
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// `all` or a single status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl TryFrom<String> for StatusFilter {
    type Error = lumiere_core::ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() || value == "all" {
            Ok(Self::All)
        } else {
            value.parse().map(Self::Only)
        }
    }
}

impl StatusFilter {
    #[must_use]
    pub fn matches(self, status: OrderStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderQuery {
    pub q: Option<String>,
    pub status: StatusFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderList {
    /// Stats over the whole book, not just the filtered list.
    pub stats: OrderStats,
    pub orders: Vec<OrderView>,
}

/// Filter the order book for the admin order list.
#[must_use]
pub fn list_orders(book: &OrderBook, query: &OrderQuery) -> OrderList {
    let orders = book.all();
    let stats = OrderStats::of(&orders);
    let term = query.q.as_deref().unwrap_or("").trim();

    OrderList {
        stats,
        orders: orders
            .into_iter()
            .filter(|o| query.status.matches(o.status))
            .filter(|o| term.is_empty() || o.matches_search(term))
            .map(OrderView::from)
            .collect(),
    }
}

/// Change an order's status.
///
/// # Errors
///
/// Returns `AdminError::Order` for an unknown order or a forbidden move.
pub fn update_order_status(
    book: &OrderBook,
    id: OrderId,
    status: OrderStatus,
    now: DateTime<Utc>,
) -> Result<Order, AdminError> {
    let order = book.set_status(id, status, now)?;
    info!(order_id = %id, status = %status, "Order status updated");
    Ok(order)
}

// =============================================================================
// Products
// =============================================================================

/// Admin view of a product with its computed stock state.
#[derive(Debug, Clone, Serialize)]
pub struct AdminProduct {
    #[serde(flatten)]
    pub product: Product,
    pub available: i32,
    pub stock_status: StockStatus,
    pub stock_label: &'static str,
}

impl From<Product> for AdminProduct {
    fn from(product: Product) -> Self {
        let stock_status = product.stock_status();
        Self {
            available: product.inventory.available(),
            stock_status,
            stock_label: stock_status.label(),
            product,
        }
    }
}

/// Products whose title or author contain `term`, ignoring case.
#[must_use]
pub fn list_products(store: &ProductStore, term: Option<&str>) -> Vec<AdminProduct> {
    let term = term.unwrap_or("").trim().to_lowercase();
    store
        .all()
        .into_iter()
        .filter(|p| {
            term.is_empty()
                || p.title.to_lowercase().contains(&term)
                || p.author.to_lowercase().contains(&term)
        })
        .map(AdminProduct::from)
        .collect()
}

const fn default_active() -> bool {
    true
}

/// The create/edit product form.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    pub price: Option<Decimal>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub quantity: Option<i32>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl ProductForm {
    /// # Errors
    ///
    /// Returns `ValidationError::Required` for a blank title, author or
    /// category and `ValidationError::Invalid` for a price that is not
    /// positive or a negative quantity.
    pub fn validate(self) -> Result<ProductDraft, ValidationError> {
        crate::validation::require("title", &self.title)?;
        crate::validation::require("author", &self.author)?;
        crate::validation::require("category", &self.category)?;

        let price = self
            .price
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| ValidationError::Invalid {
                field: "price",
                reason: "le prix doit être supérieur à 0".to_string(),
            })?;
        let quantity = self.quantity.unwrap_or(0);
        if quantity < 0 {
            return Err(ValidationError::Invalid {
                field: "quantity",
                reason: "la quantité ne peut pas être négative".to_string(),
            });
        }

        Ok(ProductDraft {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            price,
            description: self.description.trim().to_string(),
            category: self.category.trim().to_string(),
            quantity,
            is_active: self.is_active,
        })
    }
}

/// # Errors
///
/// Returns `AdminError::Validation` for an invalid form.
pub fn create_product(
    store: &ProductStore,
    form: ProductForm,
    now: DateTime<Utc>,
) -> Result<AdminProduct, AdminError> {
    let product = store.create(form.validate()?, now);
    info!(product_id = %product.id, title = %product.title, "Product created");
    Ok(product.into())
}

/// # Errors
///
/// Returns `AdminError::Validation` for an invalid form and
/// `AdminError::ProductNotFound` for an unknown id.
pub fn update_product(
    store: &ProductStore,
    id: ProductId,
    form: ProductForm,
) -> Result<AdminProduct, AdminError> {
    let draft = form.validate()?;
    let product = store
        .update(id, draft)
        .ok_or(AdminError::ProductNotFound(id))?;
    info!(product_id = %id, "Product updated");
    Ok(product.into())
}

/// # Errors
///
/// Returns `AdminError::ProductNotFound` for an unknown id.
pub fn toggle_product(store: &ProductStore, id: ProductId) -> Result<AdminProduct, AdminError> {
    let product = store
        .toggle_active(id)
        .ok_or(AdminError::ProductNotFound(id))?;
    info!(product_id = %id, is_active = product.is_active, "Product visibility toggled");
    Ok(product.into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            title: "Le Petit Prince".to_string(),
            author: "Antoine de Saint-Exupéry".to_string(),
            price: Some(Decimal::new(1290, 2)),
            description: String::new(),
            category: "Jeunesse".to_string(),
            quantity: Some(10),
            is_active: true,
        }
    }

    #[test]
    fn test_dashboard_counts() {
        let dashboard = Dashboard::build(&OrderBook::seeded(), &ProductStore::seeded());
        assert_eq!(dashboard.orders.total, 7);
        assert_eq!(dashboard.orders.pending, 1);
        assert_eq!(dashboard.orders.cancelled, 0);
        assert_eq!(dashboard.active_products, 6);
        assert_eq!(dashboard.out_of_stock_products, 1);
        assert_eq!(dashboard.recent_orders.len(), RECENT_ORDERS);
        assert!(dashboard.revenue > Decimal::ZERO);
    }

    #[test]
    fn test_revenue_skips_cancelled_orders() {
        let book = OrderBook::seeded();
        let before = Dashboard::build(&book, &ProductStore::seeded()).revenue;

        let pending = book
            .all()
            .into_iter()
            .find(|o| o.status == OrderStatus::Pending)
            .unwrap();
        book.set_status(pending.id, OrderStatus::Cancelled, Utc::now())
            .unwrap();

        let after = Dashboard::build(&book, &ProductStore::seeded()).revenue;
        assert_eq!(after, before - pending.total_amount);
    }

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!(StatusFilter::try_from("all".to_string()).unwrap(), StatusFilter::All);
        assert_eq!(
            StatusFilter::try_from("shipped".to_string()).unwrap(),
            StatusFilter::Only(OrderStatus::Shipped)
        );
        assert!(StatusFilter::try_from("lost".to_string()).is_err());
    }

    #[test]
    fn test_list_orders_filters_and_keeps_stats() {
        let book = OrderBook::seeded();
        let list = list_orders(
            &book,
            &OrderQuery {
                q: None,
                status: StatusFilter::Only(OrderStatus::Delivered),
            },
        );
        assert_eq!(list.stats.total, 7);
        assert!(list.orders.iter().all(|o| o.order.status == OrderStatus::Delivered));
        assert_eq!(list.orders.len(), list.stats.delivered);

        let by_name = list_orders(
            &book,
            &OrderQuery {
                q: Some("DUPONT".to_string()),
                status: StatusFilter::All,
            },
        );
        assert_eq!(by_name.orders.len(), 1);
    }

    #[test]
    fn test_forbidden_transition_is_rejected() {
        let book = OrderBook::seeded();
        let delivered = book
            .all()
            .into_iter()
            .find(|o| o.status == OrderStatus::Delivered)
            .unwrap();
        let err = update_order_status(&book, delivered.id, OrderStatus::Pending, Utc::now())
            .unwrap_err();
        assert!(matches!(err, AdminError::Order(OrderError::InvalidTransition { .. })));
    }

    #[test]
    fn test_product_form_validation() {
        assert!(form().validate().is_ok());

        let missing = ProductForm {
            category: " ".to_string(),
            ..form()
        };
        assert_eq!(missing.validate().unwrap_err(), ValidationError::Required("category"));

        let free = ProductForm {
            price: Some(Decimal::ZERO),
            ..form()
        };
        assert!(matches!(
            free.validate().unwrap_err(),
            ValidationError::Invalid { field: "price", .. }
        ));

        let negative = ProductForm {
            quantity: Some(-1),
            ..form()
        };
        assert!(matches!(
            negative.validate().unwrap_err(),
            ValidationError::Invalid { field: "quantity", .. }
        ));
    }

    #[test]
    fn test_product_management() {
        let store = ProductStore::seeded();
        let created = create_product(&store, form(), Utc::now()).unwrap();
        assert_eq!(created.product.id, ProductId::new(7));
        assert_eq!(created.stock_status, StockStatus::InStock);

        let toggled = toggle_product(&store, created.product.id).unwrap();
        assert!(!toggled.product.is_active);

        let found = list_products(&store, Some("saint-exupéry"));
        assert_eq!(found.len(), 1);

        let err = toggle_product(&store, ProductId::new(999)).unwrap_err();
        assert!(matches!(err, AdminError::ProductNotFound(_)));
    }
}
