//! Table API calls (`/rest/v1`).

use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use chrono::Utc;
use serde_json::json;

use lumiere_core::{AddressId, OrderId, OrderStatus, ProductId, UserId, UserRole};

use super::cache::{CacheKey, CacheValue};
use super::client::{BackendClient, SINGLE_OBJECT};
use super::types::{
    Address, AddressUpdate, AuthSession, Category, CreateOrderParams, NewAddress, NewReview,
    OrderRow, ProductRow, Profile, ProfileUpdate, Review,
};
use super::BackendError;

const PRODUCT_LIST_SELECT: &str = "*,category:categories(name,slug),inventory(quantity)";
const PRODUCT_DETAIL_SELECT: &str =
    "*,category:categories(name,slug),inventory(quantity,reserved_quantity)";
const ORDER_LIST_SELECT: &str = "*,order_items(*,product:products(title,author,images))";
const ORDER_DETAIL_SELECT: &str = "*,order_items(*,product:products(*))";
const REVIEW_SELECT: &str = "*,user:users(first_name,last_name)";

/// Characters that would break out of a PostgREST `or=(...)` filter.
const FILTER_RESERVED: &[char] = &[',', '(', ')', '*'];

/// Strip filter syntax from a free-text search term.
#[must_use]
pub fn sanitize_search_term(term: &str) -> String {
    term.chars()
        .filter(|c| !FILTER_RESERVED.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

fn token(session: Option<&AuthSession>) -> Option<&str> {
    session.map(AuthSession::access_token)
}

impl BackendClient {
    fn table_url(&self, table: &str, params: &[(&str, &str)]) -> Result<Url, BackendError> {
        let mut url = self.rest_url(table)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn select_many<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, &str)],
        session: Option<&AuthSession>,
    ) -> Result<Vec<T>, BackendError> {
        let url = self.table_url(table, params)?;
        self.execute(self.request(Method::GET, url, token(session)))
            .await
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, &str)],
        session: Option<&AuthSession>,
    ) -> Result<T, BackendError> {
        let url = self.table_url(table, params)?;
        let request = self
            .request(Method::GET, url, token(session))
            .header("Accept", SINGLE_OBJECT);
        self.execute(request).await
    }

    async fn write_one<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        method: Method,
        table: &str,
        params: &[(&str, &str)],
        body: &B,
        session: Option<&AuthSession>,
    ) -> Result<T, BackendError> {
        let url = self.table_url(table, params)?;
        let request = self
            .request(method, url, token(session))
            .header("Accept", SINGLE_OBJECT)
            .header("Prefer", "return=representation")
            .json(body);
        self.execute(request).await
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// Insert a profile row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row is rejected (e.g. duplicate id).
    #[instrument(skip(self, profile, session), fields(user_id = %profile.id))]
    pub async fn create_profile(
        &self,
        profile: &Profile,
        session: Option<&AuthSession>,
    ) -> Result<Profile, BackendError> {
        self.write_one(Method::POST, "users", &[], profile, session)
            .await
    }

    /// Fetch a profile row.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` when the user has no profile row.
    #[instrument(skip(self, session), fields(user_id = %user_id))]
    pub async fn get_profile(
        &self,
        user_id: &UserId,
        session: Option<&AuthSession>,
    ) -> Result<Profile, BackendError> {
        let id = format!("eq.{user_id}");
        self.select_one("users", &[("select", "*"), ("id", &id)], session)
            .await
    }

    /// Update a profile row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row does not exist or the update is rejected.
    #[instrument(skip(self, update, session), fields(user_id = %user_id))]
    pub async fn update_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
        session: Option<&AuthSession>,
    ) -> Result<Profile, BackendError> {
        let id = format!("eq.{user_id}");
        self.write_one(Method::PATCH, "users", &[("id", &id)], update, session)
            .await
    }

    /// Whether the user's profile carries the admin role.
    ///
    /// A user without a profile row is not an admin.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be read.
    pub async fn is_admin(
        &self,
        user_id: &UserId,
        session: Option<&AuthSession>,
    ) -> Result<bool, BackendError> {
        match self.get_profile(user_id, session).await {
            Ok(profile) => Ok(profile.role == UserRole::Admin),
            Err(BackendError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Products & categories
    // =========================================================================

    /// All active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self) -> Result<Vec<ProductRow>, BackendError> {
        if let Some(CacheValue::Products(products)) = self.cache_get(&CacheKey::Products).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Vec<ProductRow> = self
            .select_many(
                "products",
                &[
                    ("select", PRODUCT_LIST_SELECT),
                    ("is_active", "eq.true"),
                    ("order", "created_at.desc"),
                ],
                None,
            )
            .await?;

        self.cache_insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// One active product with reserved stock.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the product does not exist or is inactive.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<ProductRow, BackendError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.cache_get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let id_filter = format!("eq.{id}");
        let product: ProductRow = self
            .select_one(
                "products",
                &[
                    ("select", PRODUCT_DETAIL_SELECT),
                    ("id", &id_filter),
                    ("is_active", "eq.true"),
                ],
                None,
            )
            .await?;

        self.cache_insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Active products whose title, author or description contains `query`.
    ///
    /// Search results are not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &str) -> Result<Vec<ProductRow>, BackendError> {
        let term = sanitize_search_term(query);
        let filter = format!(
            "(title.ilike.%{term}%,author.ilike.%{term}%,description.ilike.%{term}%)"
        );
        self.select_many(
            "products",
            &[
                ("select", PRODUCT_LIST_SELECT),
                ("or", &filter),
                ("is_active", "eq.true"),
                ("order", "created_at.desc"),
            ],
            None,
        )
        .await
    }

    /// Active categories in display order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<Category>, BackendError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache_get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Vec<Category> = self
            .select_many(
                "categories",
                &[
                    ("select", "*"),
                    ("is_active", "eq.true"),
                    ("order", "sort_order.asc"),
                ],
                None,
            )
            .await?;

        self.cache_insert(
            CacheKey::Categories,
            CacheValue::Categories(categories.clone()),
        )
        .await;

        Ok(categories)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Create an order through the `create_order` RPC, which also reserves
    /// stock. Returns the new order's id.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC rejects the order.
    #[instrument(skip(self, params, session), fields(order_number = %params.order_number))]
    pub async fn create_order(
        &self,
        params: &CreateOrderParams,
        session: &AuthSession,
    ) -> Result<OrderId, BackendError> {
        let url = self.rest_url("rpc/create_order")?;
        let request = self
            .request(Method::POST, url, Some(session.access_token()))
            .json(params);
        let id: OrderId = self.execute(request).await?;

        // Inventory changed
        self.invalidate_catalog();

        Ok(id)
    }

    /// A user's orders with their items, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(user_id = %user_id))]
    pub async fn get_user_orders(
        &self,
        user_id: &UserId,
        session: Option<&AuthSession>,
    ) -> Result<Vec<OrderRow>, BackendError> {
        let user_filter = format!("eq.{user_id}");
        self.select_many(
            "orders",
            &[
                ("select", ORDER_LIST_SELECT),
                ("user_id", &user_filter),
                ("order", "created_at.desc"),
            ],
            session,
        )
        .await
    }

    /// One order with full product rows on its items.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if no such order is visible to the caller.
    #[instrument(skip(self, session), fields(order_id = %id))]
    pub async fn get_order(
        &self,
        id: OrderId,
        session: Option<&AuthSession>,
    ) -> Result<OrderRow, BackendError> {
        let id_filter = format!("eq.{id}");
        self.select_one(
            "orders",
            &[("select", ORDER_DETAIL_SELECT), ("id", &id_filter)],
            session,
        )
        .await
    }

    /// Cancel one of the user's orders while it is still pending.
    ///
    /// The status filter makes the update a no-op once processing has
    /// started; the backend then reports no row.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if no pending order matched.
    #[instrument(skip(self, session), fields(order_id = %id, user_id = %user_id))]
    pub async fn cancel_order(
        &self,
        id: OrderId,
        user_id: &UserId,
        session: &AuthSession,
    ) -> Result<OrderRow, BackendError> {
        let id_filter = format!("eq.{id}");
        let user_filter = format!("eq.{user_id}");
        let status_filter = format!("eq.{}", OrderStatus::Pending.as_str());
        self.write_one(
            Method::PATCH,
            "orders",
            &[
                ("select", ORDER_LIST_SELECT),
                ("id", &id_filter),
                ("user_id", &user_filter),
                ("status", &status_filter),
            ],
            &json!({
                "status": OrderStatus::Cancelled,
                "updated_at": Utc::now(),
            }),
            Some(session),
        )
        .await
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// A user's addresses, default address first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(user_id = %user_id))]
    pub async fn get_user_addresses(
        &self,
        user_id: &UserId,
        session: Option<&AuthSession>,
    ) -> Result<Vec<Address>, BackendError> {
        let user_filter = format!("eq.{user_id}");
        self.select_many(
            "addresses",
            &[
                ("select", "*"),
                ("user_id", &user_filter),
                ("order", "is_default.desc"),
            ],
            session,
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the row is rejected.
    #[instrument(skip_all)]
    pub async fn create_address(
        &self,
        address: &NewAddress,
        session: Option<&AuthSession>,
    ) -> Result<Address, BackendError> {
        self.write_one(Method::POST, "addresses", &[], address, session)
            .await
    }

    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the address does not exist.
    #[instrument(skip(self, update, session), fields(address_id = %id))]
    pub async fn update_address(
        &self,
        id: AddressId,
        update: &AddressUpdate,
        session: Option<&AuthSession>,
    ) -> Result<Address, BackendError> {
        let id_filter = format!("eq.{id}");
        self.write_one(Method::PATCH, "addresses", &[("id", &id_filter)], update, session)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(address_id = %id))]
    pub async fn delete_address(
        &self,
        id: AddressId,
        session: Option<&AuthSession>,
    ) -> Result<(), BackendError> {
        let id_filter = format!("eq.{id}");
        let url = self.table_url("addresses", &[("id", &id_filter)])?;
        self.execute_empty(self.request(Method::DELETE, url, token(session)))
            .await
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// Approved reviews of a product with reviewer names, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product_reviews(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, BackendError> {
        let product_filter = format!("eq.{product_id}");
        self.select_many(
            "reviews",
            &[
                ("select", REVIEW_SELECT),
                ("product_id", &product_filter),
                ("is_approved", "eq.true"),
                ("order", "created_at.desc"),
            ],
            None,
        )
        .await
    }

    /// Submit a review; it stays hidden until approved.
    ///
    /// # Errors
    ///
    /// Returns an error if the row is rejected.
    #[instrument(skip_all)]
    pub async fn create_review(
        &self,
        review: &NewReview,
        session: &AuthSession,
    ) -> Result<Review, BackendError> {
        self.write_one(Method::POST, "reviews", &[], review, Some(session))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_filter_syntax() {
        assert_eq!(sanitize_search_term("temps),id.gt.(0"), "tempsid.gt.0");
        assert_eq!(sanitize_search_term("  *murmures*  "), "murmures");
        assert_eq!(sanitize_search_term("Jardin des Secrets"), "Jardin des Secrets");
    }
}
