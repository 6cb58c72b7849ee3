//! Session database.
//!
//! The storefront keeps no data of its own besides sessions: each browser's
//! cart, wishlist, checkout step and auth context are serialized into the
//! `tower-sessions` SQLite table. Products, orders and profiles live in the
//! backend or in the in-memory demo stores.

use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

/// Create a SQLite connection pool for the session store.
///
/// An in-memory URL (`sqlite::memory:`) gets a single connection that is
/// never recycled, so every request sees the same database.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(10));

    let options = if database_url.contains(":memory:") {
        options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        options.max_connections(5)
    };

    options.connect(database_url).await
}
