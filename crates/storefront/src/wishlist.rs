//! Per-session wishlist.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use lumiere_core::ProductId;

use crate::catalog::Product;
use crate::models::session_keys;

/// Catalog ids and dates of the items a demo session starts with.
const DEMO_ITEMS: [(i32, u32, u32); 4] = [(1, 9, 15), (2, 9, 10), (4, 9, 8), (5, 9, 5)];

/// A saved product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: ProductId,
    pub title: String,
    pub author: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub rating: f32,
    pub category: String,
    pub in_stock: bool,
    pub date_added: NaiveDate,
}

impl WishlistItem {
    #[must_use]
    pub fn new(product: &Product, date_added: NaiveDate) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            author: product.author.clone(),
            price: product.price,
            original_price: product.original_price,
            rating: product.rating,
            category: product.category.clone(),
            in_stock: product.in_stock(),
            date_added,
        }
    }

    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.original_price.is_some_and(|original| original > self.price)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WishlistSort {
    /// Most recently added first.
    #[default]
    DateAdded,
    PriceAsc,
    PriceDesc,
    Rating,
    /// Title A-Z.
    Title,
}

/// Query string of `GET /wishlist`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WishlistQuery {
    pub category: Option<String>,
    pub sort: WishlistSort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WishlistStats {
    pub count: usize,
    pub in_stock: usize,
    pub total_value: Decimal,
    pub on_sale: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wishlist {
    items: Vec<WishlistItem>,
}

impl Wishlist {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// The wishlist a demo session starts with, built from `catalog`.
    #[must_use]
    pub fn demo(catalog: &[Product]) -> Self {
        let items = DEMO_ITEMS
            .iter()
            .filter_map(|&(id, month, day)| {
                let product = catalog.iter().find(|p| p.id.as_i32() == id)?;
                let date = NaiveDate::from_ymd_opt(2024, month, day)?;
                Some(WishlistItem::new(product, date))
            })
            .collect();
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&WishlistItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Add the product, or remove it if already saved.
    ///
    /// Returns `true` when the product is in the wishlist afterwards.
    pub fn toggle(&mut self, product: &Product, today: NaiveDate) -> bool {
        if self.remove(product.id) {
            false
        } else {
            self.items.push(WishlistItem::new(product, today));
            true
        }
    }

    /// Returns `true` if an item was removed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Items that can be added to the cart.
    pub fn in_stock_items(&self) -> impl Iterator<Item = &WishlistItem> {
        self.items.iter().filter(|item| item.in_stock)
    }

    /// Filtered and sorted copy of the items.
    #[must_use]
    pub fn view(&self, query: &WishlistQuery) -> Vec<WishlistItem> {
        let category = query.category.as_deref().filter(|c| !c.is_empty());
        let mut items: Vec<WishlistItem> = self
            .items
            .iter()
            .filter(|item| category.is_none_or(|c| item.category == c))
            .cloned()
            .collect();

        match query.sort {
            WishlistSort::DateAdded => items.sort_by(|a, b| b.date_added.cmp(&a.date_added)),
            WishlistSort::PriceAsc => items.sort_by(|a, b| a.price.cmp(&b.price)),
            WishlistSort::PriceDesc => items.sort_by(|a, b| b.price.cmp(&a.price)),
            WishlistSort::Rating => items.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
            WishlistSort::Title => items.sort_by(|a, b| a.title.cmp(&b.title)),
        }
        items
    }

    /// Distinct categories of the saved items.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for item in &self.items {
            if !categories.contains(&item.category) {
                categories.push(item.category.clone());
            }
        }
        categories
    }

    #[must_use]
    pub fn stats(&self) -> WishlistStats {
        WishlistStats {
            count: self.items.len(),
            in_stock: self.in_stock_items().count(),
            total_value: self.items.iter().map(|item| item.price).sum(),
            on_sale: self.items.iter().filter(|item| item.is_on_sale()).count(),
        }
    }
}

impl Wishlist {
    /// Read the wishlist from the session; a missing entry is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        Ok(session
            .get::<Self>(session_keys::WISHLIST)
            .await?
            .unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(session_keys::WISHLIST, self).await
    }
}
