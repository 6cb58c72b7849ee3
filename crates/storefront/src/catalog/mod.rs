//! Product catalog.
//!
//! In backend mode products are read through the [`BackendClient`] and any
//! load failure falls back to the built-in demo catalog. In demo mode the
//! [`ProductStore`] (seeded with the demo catalog and edited by the admin
//! panel) is the only source.

mod demo;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use lumiere_core::{CartProduct, CategoryId, Price, ProductId};

use crate::backend::{BackendClient, BackendError, Category, ProductRow};
use crate::config::AuthMode;
use crate::recommendations;

/// Stock at or below this count is reported as low.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

const UNCATEGORIZED: &str = "Non classé";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub quantity: i32,
    pub reserved_quantity: i32,
}

impl Inventory {
    /// Units that can still be sold.
    #[must_use]
    pub const fn available(&self) -> i32 {
        self.quantity - self.reserved_quantity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    Low,
    InStock,
}

impl StockStatus {
    #[must_use]
    pub const fn from_available(available: i32) -> Self {
        if available <= 0 {
            Self::OutOfStock
        } else if available <= LOW_STOCK_THRESHOLD {
            Self::Low
        } else {
            Self::InStock
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OutOfStock => "Rupture",
            Self::Low => "Stock faible",
            Self::InStock => "En stock",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub author: String,
    pub description: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub rating: f32,
    pub review_count: u32,
    pub category: String,
    pub tags: Vec<String>,
    pub is_active: bool,
    pub inventory: Inventory,
    pub created_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.inventory.available() > 0
    }

    #[must_use]
    pub const fn stock_status(&self) -> StockStatus {
        StockStatus::from_available(self.inventory.available())
    }

    /// Whether an original price above the current one is shown.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.original_price.is_some_and(|original| original > self.price)
    }

    #[must_use]
    pub fn display_price(&self) -> Price {
        Price::eur(self.price)
    }

    /// The snapshot of this product stored in a cart line item.
    #[must_use]
    pub fn cart_product(&self) -> CartProduct {
        CartProduct {
            id: self.id,
            title: self.title.clone(),
            author: self.author.clone(),
            price: self.price,
        }
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let inventory = row
            .inventory
            .and_then(|embedded| embedded.into_first())
            .map(|inv| Inventory {
                quantity: inv.quantity,
                reserved_quantity: inv.reserved_quantity,
            })
            .unwrap_or_default();

        Self {
            id: row.id,
            title: row.title,
            author: row.author,
            description: row.description,
            price: row.price,
            original_price: row.original_price,
            rating: row.rating.unwrap_or_default(),
            review_count: row.review_count.unwrap_or_default(),
            category: row
                .category
                .map_or_else(|| UNCATEGORIZED.to_string(), |c| c.name),
            tags: row.tags,
            is_active: row.is_active,
            inventory,
            created_at: row.created_at,
        }
    }
}

/// Fields an admin can set on a product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub title: String,
    pub author: String,
    pub price: Decimal,
    pub description: String,
    pub category: String,
    pub quantity: i32,
    pub is_active: bool,
}

/// In-memory product list shared by the demo catalog and the admin panel.
pub struct ProductStore {
    products: RwLock<Vec<Product>>,
}

impl ProductStore {
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
        }
    }

    /// Store pre-filled with the demo catalog.
    #[must_use]
    pub fn seeded() -> Self {
        Self::new(demo::products())
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Product>> {
        self.products.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Product>> {
        self.products.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every product, active or not.
    #[must_use]
    pub fn all(&self) -> Vec<Product> {
        self.read().clone()
    }

    #[must_use]
    pub fn active(&self) -> Vec<Product> {
        self.read().iter().filter(|p| p.is_active).cloned().collect()
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<Product> {
        self.read().iter().find(|p| p.id == id).cloned()
    }

    /// Add a product with the next free id.
    pub fn create(&self, draft: ProductDraft, now: DateTime<Utc>) -> Product {
        let mut products = self.write();
        let next_id = products.iter().map(|p| p.id.as_i32()).max().unwrap_or(0) + 1;

        let product = Product {
            id: ProductId::new(next_id),
            title: draft.title,
            author: draft.author,
            description: draft.description,
            price: draft.price,
            original_price: None,
            rating: 0.0,
            review_count: 0,
            category: draft.category,
            tags: Vec::new(),
            is_active: draft.is_active,
            inventory: Inventory {
                quantity: draft.quantity,
                reserved_quantity: 0,
            },
            created_at: now,
        };
        products.push(product.clone());
        product
    }

    /// Overwrite the editable fields of a product.
    ///
    /// Reserved stock is kept; returns `None` for an unknown id.
    pub fn update(&self, id: ProductId, draft: ProductDraft) -> Option<Product> {
        let mut products = self.write();
        let product = products.iter_mut().find(|p| p.id == id)?;

        product.title = draft.title;
        product.author = draft.author;
        product.description = draft.description;
        product.price = draft.price;
        product.category = draft.category;
        product.is_active = draft.is_active;
        product.inventory.quantity = draft.quantity;
        Some(product.clone())
    }

    /// Flip a product between active and inactive.
    pub fn toggle_active(&self, id: ProductId) -> Option<Product> {
        let mut products = self.write();
        let product = products.iter_mut().find(|p| p.id == id)?;
        product.is_active = !product.is_active;
        Some(product.clone())
    }
}

impl Default for ProductStore {
    fn default() -> Self {
        Self::seeded()
    }
}

/// Read access to the catalog for the current auth mode.
#[derive(Clone, Copy)]
pub struct Catalog<'a> {
    backend: &'a BackendClient,
    store: &'a ProductStore,
    mode: AuthMode,
}

impl<'a> Catalog<'a> {
    #[must_use]
    pub const fn new(backend: &'a BackendClient, store: &'a ProductStore, mode: AuthMode) -> Self {
        Self {
            backend,
            store,
            mode,
        }
    }

    /// Active products, newest first in backend mode, catalog order in demo mode.
    pub async fn products(&self) -> Vec<Product> {
        if self.mode.is_demo() {
            return self.store.active();
        }

        match self.backend.get_products().await {
            Ok(rows) => rows.into_iter().map(Product::from).collect(),
            Err(e) => {
                warn!(error = %e, "Failed to load products, using demo catalog");
                self.store.active()
            }
        }
    }

    /// An active product, or a recommendation-only title with that id.
    pub async fn product(&self, id: ProductId) -> Option<Product> {
        let found = if self.mode.is_demo() {
            self.local_product(id)
        } else {
            match self.backend.get_product(id).await {
                Ok(row) => Some(Product::from(row)),
                Err(BackendError::NotFound(_)) => None,
                Err(e) => {
                    warn!(error = %e, product_id = %id, "Failed to load product, using demo catalog");
                    self.local_product(id)
                }
            }
        };

        found.or_else(|| recommendations::find_book(id))
    }

    /// Products matching a text query, from the backend in backend mode.
    ///
    /// Demo mode, a blank query or a failed backend call return `local`
    /// unchanged; the caller filters it.
    pub async fn search(&self, query: &str, local: &[Product]) -> Vec<Product> {
        if self.mode.is_demo() || query.trim().is_empty() {
            return local.to_vec();
        }

        match self.backend.search_products(query.trim()).await {
            Ok(rows) => rows.into_iter().map(Product::from).collect(),
            Err(e) => {
                warn!(error = %e, "Backend search failed, searching locally");
                local.to_vec()
            }
        }
    }

    fn local_product(&self, id: ProductId) -> Option<Product> {
        self.store.get(id).filter(|p| p.is_active)
    }

    /// Product categories, by sort order.
    pub async fn categories(&self) -> Vec<Category> {
        if !self.mode.is_demo() {
            match self.backend.get_categories().await {
                Ok(categories) => return categories,
                Err(e) => warn!(error = %e, "Failed to load categories, using demo catalog"),
            }
        }
        categories_of(&self.store.active())
    }
}

/// Distinct categories of `products`, in first-seen order.
#[must_use]
pub fn categories_of(products: &[Product]) -> Vec<Category> {
    let mut names: Vec<&str> = Vec::new();
    for product in products {
        if !names.contains(&product.category.as_str()) {
            names.push(&product.category);
        }
    }

    names
        .into_iter()
        .zip(1..)
        .map(|(name, position)| Category {
            id: CategoryId::new(position),
            name: name.to_string(),
            slug: slugify(name),
            description: None,
            sort_order: position,
        })
        .collect()
}

fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;

    fn draft(title: &str) -> ProductDraft {
        ProductDraft {
            title: title.to_string(),
            author: "Anne Autrice".to_string(),
            price: Decimal::new(1500, 2),
            description: String::new(),
            category: "Poésie".to_string(),
            quantity: 4,
            is_active: true,
        }
    }

    #[test]
    fn test_stock_status_thresholds() {
        assert_eq!(StockStatus::from_available(-1), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_available(0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_available(5), StockStatus::Low);
        assert_eq!(StockStatus::from_available(6), StockStatus::InStock);
        assert_eq!(StockStatus::Low.label(), "Stock faible");
    }

    #[test]
    fn test_demo_catalog_stock() {
        let store = ProductStore::seeded();
        let cuisine = store.get(ProductId::new(4)).unwrap();
        assert!(!cuisine.in_stock());
        assert_eq!(cuisine.stock_status(), StockStatus::OutOfStock);

        let murmures = store.get(ProductId::new(1)).unwrap();
        assert!(murmures.is_on_sale());
        assert_eq!(murmures.inventory.available(), 44);
        assert_eq!(murmures.display_price().to_string(), "€24.90");
    }

    #[test]
    fn test_create_update_toggle() {
        let store = ProductStore::seeded();
        let created = store.create(draft("Poèmes"), Utc::now());
        assert_eq!(created.id, ProductId::new(7));
        assert_eq!(created.stock_status(), StockStatus::Low);

        let mut changed = draft("Poèmes choisis");
        changed.quantity = 0;
        let updated = store.update(created.id, changed).unwrap();
        assert_eq!(updated.title, "Poèmes choisis");
        assert!(!updated.in_stock());

        let toggled = store.toggle_active(created.id).unwrap();
        assert!(!toggled.is_active);
        assert!(store.active().iter().all(|p| p.id != created.id));

        assert!(store.update(ProductId::new(999), draft("x")).is_none());
        assert!(store.toggle_active(ProductId::new(999)).is_none());
    }

    #[test]
    fn test_categories_in_first_seen_order() {
        let categories = categories_of(&ProductStore::seeded().all());
        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            ["Fiction", "Romance", "Histoire", "Cuisine", "Informatique", "Bien-être"]
        );
        assert_eq!(categories[5].slug, "bien-être");
    }

    #[tokio::test]
    async fn test_demo_catalog_resolves_recommendations() {
        let backend = BackendClient::new(&BackendConfig::fallback());
        let store = ProductStore::seeded();
        let catalog = Catalog::new(&backend, &store, AuthMode::Demo);

        assert_eq!(catalog.products().await.len(), 6);
        assert!(catalog.product(ProductId::new(2)).await.is_some());
        let trending = catalog.product(ProductId::new(104)).await.unwrap();
        assert_eq!(trending.title, "Le Phénomène TikTok");
        assert!(catalog.product(ProductId::new(404)).await.is_none());

        store.toggle_active(ProductId::new(2));
        assert!(catalog.product(ProductId::new(2)).await.is_none());
    }

    #[tokio::test]
    async fn test_demo_search_keeps_local_candidates() {
        let backend = BackendClient::new(&BackendConfig::fallback());
        let store = ProductStore::seeded();
        let catalog = Catalog::new(&backend, &store, AuthMode::Demo);

        let local = store.active();
        assert_eq!(catalog.search("temps", &local).await.len(), local.len());
    }
}
