//! Product search, filters and sorting.
//!
//! Everything here is a synchronous pass over a product list that is
//! already in memory.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Input order.
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    /// Best rated first.
    Rating,
    /// Highest id first.
    Newest,
}

impl SortOrder {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Relevance => "Pertinence",
            Self::PriceAsc => "Prix croissant",
            Self::PriceDesc => "Prix décroissant",
            Self::Rating => "Mieux notés",
            Self::Newest => "Plus récents",
        }
    }
}

fn default_max_price() -> Decimal {
    Decimal::ONE_HUNDRED
}

/// Query string of `GET /search`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    #[serde(rename = "q")]
    pub query: String,
    pub category: Option<String>,
    pub min_price: Decimal,
    #[serde(default = "default_max_price")]
    pub max_price: Decimal,
    pub min_rating: f32,
    pub in_stock: bool,
    pub author: Option<String>,
    pub sort: SortOrder,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: None,
            min_price: Decimal::ZERO,
            max_price: default_max_price(),
            min_rating: 0.0,
            in_stock: false,
            author: None,
            sort: SortOrder::default(),
        }
    }
}

impl SearchParams {
    fn matches(&self, product: &Product) -> bool {
        let query = self.query.trim().to_lowercase();
        let matches_query = query.is_empty()
            || [&product.title, &product.author, &product.description]
                .into_iter()
                .any(|field| field.to_lowercase().contains(&query));

        let matches_category = self
            .category
            .as_deref()
            .filter(|c| !c.is_empty())
            .is_none_or(|c| product.category == c);

        let matches_price = product.price >= self.min_price && product.price <= self.max_price;
        let matches_rating = product.rating >= self.min_rating;
        let matches_stock = !self.in_stock || product.in_stock();

        let matches_author = self
            .author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .is_none_or(|a| product.author.to_lowercase().contains(&a.to_lowercase()));

        matches_query
            && matches_category
            && matches_price
            && matches_rating
            && matches_stock
            && matches_author
    }

    /// Number of filters that differ from their defaults (the query is not a filter).
    #[must_use]
    pub fn active_filter_count(&self) -> usize {
        [
            self.category.as_deref().is_some_and(|c| !c.is_empty()),
            self.min_price != Decimal::ZERO || self.max_price != default_max_price(),
            self.min_rating > 0.0,
            self.in_stock,
            self.author.as_deref().is_some_and(|a| !a.trim().is_empty()),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }
}

/// Filter `products` with `params`, then sort them.
#[must_use]
pub fn search(products: Vec<Product>, params: &SearchParams) -> Vec<Product> {
    let mut results: Vec<Product> = products.into_iter().filter(|p| params.matches(p)).collect();
    sort_products(&mut results, params.sort);
    results
}

/// Stable sort by `order`.
pub fn sort_products(products: &mut [Product], order: SortOrder) {
    let compare: fn(&Product, &Product) -> Ordering = match order {
        SortOrder::Relevance => return,
        SortOrder::PriceAsc => |a, b| a.price.cmp(&b.price),
        SortOrder::PriceDesc => |a, b| b.price.cmp(&a.price),
        SortOrder::Rating => |a, b| b.rating.total_cmp(&a.rating),
        SortOrder::Newest => |a, b| b.id.cmp(&a.id),
    };
    products.sort_by(compare);
}

/// A search result page.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub sort: SortOrder,
    pub total: usize,
    pub active_filters: usize,
    pub categories: Vec<String>,
    pub products: Vec<Product>,
}

impl SearchResults {
    /// Filter and sort `candidates`; `categories` lists every category of
    /// the full `catalog`.
    #[must_use]
    pub fn build(catalog: &[Product], candidates: Vec<Product>, params: &SearchParams) -> Self {
        let categories = crate::catalog::categories_of(catalog)
            .into_iter()
            .map(|c| c.name)
            .collect();
        let results = search(candidates, params);

        Self {
            query: params.query.clone(),
            sort: params.sort,
            total: results.len(),
            active_filters: params.active_filter_count(),
            categories,
            products: results,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::ProductStore;

    fn catalog() -> Vec<Product> {
        ProductStore::seeded().all()
    }

    fn ids(products: &[Product]) -> Vec<i32> {
        products.iter().map(|p| p.id.as_i32()).collect()
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let results = search(catalog(), &SearchParams::default());
        assert_eq!(ids(&results), [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_query_is_case_insensitive_over_title_author_description() {
        let params = |q: &str| SearchParams {
            query: q.to_string(),
            ..SearchParams::default()
        };
        assert_eq!(ids(&search(catalog(), &params("JARDIN"))), [2]);
        assert_eq!(ids(&search(catalog(), &params("sophie"))), [4]);
        assert_eq!(ids(&search(catalog(), &params("recettes"))), [4]);
        assert!(search(catalog(), &params("introuvable")).is_empty());
    }

    #[test]
    fn test_filters_combine() {
        let params = SearchParams {
            min_price: Decimal::new(20, 0),
            max_price: Decimal::new(40, 0),
            in_stock: true,
            ..SearchParams::default()
        };
        assert_eq!(ids(&search(catalog(), &params)), [1, 3]);
        assert_eq!(params.active_filter_count(), 2);

        let params = SearchParams {
            category: Some("Histoire".to_string()),
            min_rating: 4.7,
            ..SearchParams::default()
        };
        assert_eq!(ids(&search(catalog(), &params)), [3]);

        let params = SearchParams {
            author: Some(" alex ".to_string()),
            ..SearchParams::default()
        };
        assert_eq!(ids(&search(catalog(), &params)), [5]);
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let params = SearchParams {
            min_price: Decimal::new(1990, 2),
            max_price: Decimal::new(1990, 2),
            ..SearchParams::default()
        };
        assert_eq!(ids(&search(catalog(), &params)), [2]);
    }

    #[test]
    fn test_sorts() {
        let sorted = |sort| {
            ids(&search(
                catalog(),
                &SearchParams {
                    sort,
                    ..SearchParams::default()
                },
            ))
        };
        assert_eq!(sorted(SortOrder::PriceAsc), [6, 2, 1, 4, 3, 5]);
        assert_eq!(sorted(SortOrder::PriceDesc), [5, 3, 4, 1, 2, 6]);
        assert_eq!(sorted(SortOrder::Rating), [3, 5, 4, 1, 6, 2]);
        assert_eq!(sorted(SortOrder::Newest), [6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut products = catalog();
        for p in &mut products {
            p.rating = 4.0;
        }
        sort_products(&mut products, SortOrder::Rating);
        assert_eq!(ids(&products), [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_query_string_parsing() {
        let params: SearchParams =
            serde_json::from_str(r#"{"q":"temps","sort":"price-desc","in_stock":true}"#).unwrap();
        assert_eq!(params.query, "temps");
        assert_eq!(params.sort, SortOrder::PriceDesc);
        assert_eq!(params.max_price, Decimal::ONE_HUNDRED);
        assert_eq!(params.active_filter_count(), 1);
    }

    #[test]
    fn test_results_list_all_categories() {
        let params = SearchParams {
            query: "temps".to_string(),
            ..SearchParams::default()
        };
        let results = SearchResults::build(&catalog(), catalog(), &params);
        assert_eq!(results.total, 1);
        assert_eq!(results.categories.len(), 6);
    }
}
