//! Lumière Core - Shared types and cart logic.
//!
//! This crate provides common types used across all Lumière components:
//! - `storefront` - Customer-facing bookstore (catalog, cart, checkout, admin panel)
//! - `integration-tests` - Live-server tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//! Persistence of the cart is the storefront's job (see its `cart` module).
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses
//! - [`cart`] - The shopping cart reducer: line items, quantity arithmetic, totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartLineItem, CartProduct};
pub use types::*;
