//! Cache types for backend catalog reads.

use lumiere_core::ProductId;

use super::types::{Category, ProductRow};

/// Cache key for products and categories.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Product(ProductId),
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Vec<ProductRow>),
    Product(Box<ProductRow>),
    Categories(Vec<Category>),
}
