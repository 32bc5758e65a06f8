// ============================================================================
// src/handlers/mod.rs - command handlers over the sled scopes
// ============================================================================
pub mod account;
pub mod admin;
pub mod customer;
pub mod db;

use crate::db::SledStore;
use colored::Colorize;
use loyalty_core::{AuthService, Page, Stores, User};

/// What every handler runs against: the two scopes plus delivery settings.
pub struct Context<'a> {
    pub local: &'a SledStore,
    pub session: &'a SledStore,
    pub otp_echo: bool,
}

impl<'a> Context<'a> {
    pub fn stores(&self) -> Stores<'a> {
        Stores::new(self.local, self.session)
    }

    pub fn current_user(&self) -> anyhow::Result<Option<User>> {
        Ok(AuthService::new(self.stores()).current_user()?)
    }

    /// Resolves the signed-in user and checks they may use `page`.
    pub fn require(&self, page: Page) -> anyhow::Result<User> {
        let current = self.current_user()?;
        match (page.guard(current.as_ref()), current) {
            (Ok(()), Some(user)) => Ok(user),
            (Err(target), _) => Err(HandlerError::Redirect { page, target }.into()),
            // Login and register pages need no user; handlers never ask for them.
            (Ok(()), None) => Err(HandlerError::Redirect { page, target: Page::Login }.into()),
        }
    }

    /// Stands in for the email/SMS delivery of a passcode.
    pub fn deliver_otp(&self, email: &str, otp: &str) {
        if self.otp_echo {
            println!("Verification code for {}: {}", email, otp.bold());
        } else {
            println!("Verification code sent to {}", email);
        }
    }
}

/// Command-level refusals that never reach the core services.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// A page guard turned the caller away.
    #[error("Please log in as {} first (redirecting to {})", role_for(*.page), .target.path())]
    Redirect { page: Page, target: Page },

    #[error("{0} not found")]
    NotFound(String),
}

fn role_for(page: Page) -> &'static str {
    match page {
        Page::AdminDashboard => "an admin",
        _ => "a customer",
    }
}

/// Errors worth a red notification instead of a stack of context.
pub fn user_facing_message(err: &anyhow::Error) -> Option<String> {
    if let Some(core) = err.downcast_ref::<loyalty_core::Error>() {
        return core.is_user_correctable().then(|| core.to_string());
    }
    err.downcast_ref::<HandlerError>().map(|e| e.to_string())
}


#[cfg(test)]
mod tests {
    use super::test_support::Fixture;
    use super::*;
    use loyalty_core::store::{CURRENT_USER, DEFAULT_ADMIN_ID};
    use loyalty_core::KeyValueStore;

    #[test]
    fn guard_requires_signed_in_admin() {
        let fx = Fixture::new();
        let ctx = fx.ctx();

        let err = ctx.require(Page::AdminDashboard).unwrap_err();
        assert_eq!(
            user_facing_message(&err).as_deref(),
            Some("Please log in as an admin first (redirecting to index.html)")
        );

        fx.session.set_raw(CURRENT_USER, DEFAULT_ADMIN_ID).unwrap();
        assert!(ctx.require(Page::AdminDashboard).unwrap().is_admin());
        assert!(ctx.require(Page::CustomerDashboard).is_err());
    }

    #[test]
    fn store_failures_are_not_user_facing() {
        let err: anyhow::Error = loyalty_core::Error::Store(loyalty_core::StoreError::Backend("disk".into())).into();
        assert!(user_facing_message(&err).is_none());

        let err: anyhow::Error = loyalty_core::Error::InvalidOtp.into();
        assert_eq!(user_facing_message(&err).as_deref(), Some("Invalid OTP"));
    }
}
