//! Demo accounts.
//!
//! Signing in as one of these makes no backend call; the identity lives only
//! in the browser session.

use lumiere_core::{UserId, UserRole};

use crate::backend::{AuthUser, Profile};

use super::context::{AuthContext, AuthSource};

pub const ADMIN_ID: &str = "admin-demo";
pub const ADMIN_EMAIL: &str = "admin@librairie-lumiere.com";
pub const CUSTOMER_ID: &str = "customer-demo";
pub const CUSTOMER_EMAIL: &str = "client@email.com";

fn context(id: &str, email: &str, first_name: &str, last_name: &str, role: UserRole) -> AuthContext {
    AuthContext {
        user: Some(AuthUser {
            id: UserId::new(id),
            email: Some(email.to_string()),
        }),
        session: None,
        profile: Some(Profile {
            id: UserId::new(id),
            email: email.to_string(),
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            phone: None,
            role,
        }),
        source: AuthSource::Demo,
    }
}

/// Context of the demo administrator.
#[must_use]
pub fn sign_in_as_admin() -> AuthContext {
    context(ADMIN_ID, ADMIN_EMAIL, "Admin", "Demo", UserRole::Admin)
}

/// Context of the demo customer.
#[must_use]
pub fn sign_in_as_customer() -> AuthContext {
    context(CUSTOMER_ID, CUSTOMER_EMAIL, "Client", "Demo", UserRole::Customer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_admin() {
        let ctx = sign_in_as_admin();
        assert!(ctx.is_authenticated());
        assert!(ctx.is_admin());
        assert_eq!(ctx.email(), Some(ADMIN_EMAIL));
    }

    #[test]
    fn test_demo_customer() {
        let ctx = sign_in_as_customer();
        assert!(ctx.is_authenticated());
        assert!(!ctx.is_admin());
        assert_eq!(ctx.user_id().map(UserId::as_str), Some(CUSTOMER_ID));
    }
}
