//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Sign-in, sign-up, password and profile management, demo accounts
//! - `checkout` - The three-step checkout wizard and order placement
//! - `contact` - Contact form validation

pub mod auth;
pub mod checkout;
pub mod contact;

pub use auth::{AuthContext, AuthError, AuthService};
pub use checkout::{CheckoutError, CheckoutService, CheckoutState};
