//! Shopping cart reducer.
//!
//! [`Cart`] is plain data plus the mutations the storefront performs on it.
//! It does no I/O; the storefront wraps it in a store that writes every
//! mutation through to the browser session.
//!
//! Invariants held by every mutation:
//! - each line item has `quantity >= 1`
//! - there is at most one line item per [`ProductId`]
//! - line items keep insertion order

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// The product fields copied into the cart when it is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    pub id: ProductId,
    pub title: String,
    pub author: String,
    pub price: Decimal,
}

/// A product in the cart together with its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: ProductId,
    pub title: String,
    pub author: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl CartLineItem {
    fn new(product: CartProduct, quantity: u32) -> Self {
        Self {
            id: product.id,
            title: product.title,
            author: product.author,
            price: product.price,
            quantity,
        }
    }

    /// Unit price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// Unit price as a displayable [`Price`].
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::eur(self.price)
    }
}

/// An ordered list of line items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up the line item for a product.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Add `quantity` of a product.
    ///
    /// Increments the existing line item when the product is already in the
    /// cart, otherwise appends a new one. There is no stock check. Adding zero
    /// is a no-op.
    pub fn add_item(&mut self, product: CartProduct, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.items.iter_mut().find(|item| item.id == product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => self.items.push(CartLineItem::new(product, quantity)),
        }
    }

    /// Remove the line item for `id`. Unknown ids are ignored.
    pub fn remove_item(&mut self, id: ProductId) {
        self.items.retain(|item| item.id != id);
    }

    /// Set the quantity of a line item; zero or negative removes it.
    ///
    /// Unknown ids are ignored.
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of quantities across all line items.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of unit price × quantity across all line items.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// Drop line items that break the cart invariants.
    ///
    /// Used after deserializing data that was not written by this type:
    /// zero-quantity rows are removed and duplicate ids are merged into the
    /// first occurrence.
    #[must_use]
    pub fn normalized(self) -> Self {
        let mut cart = Self::new();
        for item in self.items {
            let quantity = item.quantity;
            let product = CartProduct {
                id: item.id,
                title: item.title,
                author: item.author,
                price: item.price,
            };
            cart.add_item(product, quantity);
        }
        cart
    }
}
