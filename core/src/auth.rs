//! Login with a second-step passcode.
//!
//! A login attempt moves `CredentialsEntered -> OtpPending -> Authenticated`.
//! The pending state lives entirely in the session store (`loginOTP` and
//! `pendingUser`); authentication writes `currentUser`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ids::generate_otp;
use crate::models::{User, UserType};
use crate::pages::Page;
use crate::repository::UserRepository;
use crate::store::{Stores, CURRENT_USER, LOGIN_OTP, PENDING_USER};

/// Passcode handed back in place of an email or SMS delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpChallenge {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    CredentialsEntered,
    OtpPending,
    Authenticated,
}

pub struct AuthService<'a> {
    stores: Stores<'a>,
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    pub fn new(stores: Stores<'a>) -> Self {
        Self {
            stores,
            users: UserRepository::new(stores.local),
        }
    }

    /// Checks credentials, login channel and verification, then stages a
    /// passcode for [`verify_otp`](Self::verify_otp).
    pub fn login(&self, email: &str, password: &str, channel: UserType) -> Result<OtpChallenge> {
        let user = self
            .users
            .find_by_credentials(email, password)?
            .ok_or_else(|| {
                tracing::debug!("login rejected: credentials did not match");
                Error::InvalidCredentials
            })?;

        if user.user_type != channel {
            tracing::debug!(user_id = %user.user_id, selected = %channel, "login rejected: wrong channel");
            return Err(Error::WrongLoginChannel {
                selected: channel,
                actual: user.user_type,
            });
        }

        if !user.verified {
            return Err(Error::NotVerified);
        }

        let otp = generate_otp();
        self.stores.session.set_raw(LOGIN_OTP, &otp)?;
        self.stores.session.set_raw(PENDING_USER, &user.user_id)?;
        tracing::info!(user_id = %user.user_id, "login passcode issued");

        Ok(OtpChallenge {
            email: user.email,
            otp,
        })
    }

    /// Exact string comparison against the staged code. On success the
    /// pending markers are cleared and the caller gets the dashboard to open.
    pub fn verify_otp(&self, entered: &str) -> Result<Page> {
        let stored = self.stores.session.get_raw(LOGIN_OTP)?;
        if stored.as_deref() != Some(entered) {
            tracing::debug!("login passcode mismatch");
            return Err(Error::InvalidOtp);
        }

        let user_id = self
            .stores
            .session
            .get_raw(PENDING_USER)?
            .ok_or(Error::NoPendingVerification)?;
        let user = self
            .users
            .find_by_id(&user_id)?
            .ok_or(Error::UserNotFound)?;

        self.stores.session.set_raw(CURRENT_USER, &user.user_id)?;
        self.stores.session.remove(LOGIN_OTP)?;
        self.stores.session.remove(PENDING_USER)?;
        tracing::info!(user_id = %user.user_id, user_type = %user.user_type, "user signed in");

        Ok(Page::dashboard_for(user.user_type))
    }

    /// Replaces the staged code. No limit, no cooldown.
    pub fn resend_otp(&self) -> Result<OtpChallenge> {
        let user_id = self
            .stores
            .session
            .get_raw(PENDING_USER)?
            .ok_or(Error::NoPendingVerification)?;
        let user = self
            .users
            .find_by_id(&user_id)?
            .ok_or(Error::UserNotFound)?;

        let otp = generate_otp();
        self.stores.session.set_raw(LOGIN_OTP, &otp)?;
        Ok(OtpChallenge {
            email: user.email,
            otp,
        })
    }

    pub fn logout(&self) -> Result<()> {
        self.stores.session.remove(CURRENT_USER)?;
        tracing::info!("user signed out");
        Ok(())
    }

    pub fn state(&self) -> Result<LoginState> {
        if self.stores.session.get_raw(CURRENT_USER)?.is_some() {
            Ok(LoginState::Authenticated)
        } else if self.stores.session.get_raw(LOGIN_OTP)?.is_some() {
            Ok(LoginState::OtpPending)
        } else {
            Ok(LoginState::CredentialsEntered)
        }
    }

    /// The signed-in user, if the session names one that still exists.
    pub fn current_user(&self) -> Result<Option<User>> {
        match self.stores.session.get_raw(CURRENT_USER)? {
            Some(user_id) => Ok(self.users.find_by_id(&user_id)?),
            None => Ok(None),
        }
    }
}
