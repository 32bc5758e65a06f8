//! Sign-up gated by a passcode. Nothing reaches the user collection until
//! the code is confirmed; until then the profile sits in the session store.

use serde::{Deserialize, Serialize};

use crate::auth::OtpChallenge;
use crate::error::{Error, Result};
use crate::ids::{generate_otp, generate_user_id};
use crate::models::{User, UserType};
use crate::repository::UserRepository;
use crate::store::{JsonStore, Stores, PENDING_REGISTRATION, REGISTRATION_OTP};
use crate::validation as v;

/// What the registration form submits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

/// Profile staged under `pendingRegistration`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRegistration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

pub struct RegistrationService<'a> {
    stores: Stores<'a>,
    users: UserRepository<'a>,
}

impl<'a> RegistrationService<'a> {
    pub fn new(stores: Stores<'a>) -> Self {
        Self {
            stores,
            users: UserRepository::new(stores.local),
        }
    }

    pub fn begin(&self, form: RegistrationForm) -> Result<OtpChallenge> {
        let name = form.name.trim().to_string();
        let email = form.email.trim().to_string();
        let phone = form.phone.trim().to_string();

        v::required("Name", &name).map_err(Error::InvalidInput)?;
        v::validate_email_strict(&email).map_err(Error::InvalidInput)?;
        v::optional_phone(&phone).map_err(Error::InvalidInput)?;

        if form.password != form.confirm_password {
            tracing::debug!("registration rejected: password confirmation differs");
            return Err(Error::PasswordMismatch);
        }
        if self.users.find_by_email(&email)?.is_some() {
            tracing::debug!("registration rejected: email already registered");
            return Err(Error::EmailTaken);
        }

        let otp = generate_otp();
        let pending = PendingRegistration {
            name,
            email: email.clone(),
            phone,
            password: form.password,
        };
        self.stores.session.set_raw(REGISTRATION_OTP, &otp)?;
        self.stores.session.set_json(PENDING_REGISTRATION, &pending)?;
        tracing::info!("registration passcode issued");

        Ok(OtpChallenge { email, otp })
    }

    /// Commits the staged profile as a verified customer. A wrong code keeps
    /// the staged data so the user can retry.
    pub fn verify_otp(&self, entered: &str) -> Result<User> {
        let stored = self.stores.session.get_raw(REGISTRATION_OTP)?;
        if stored.as_deref() != Some(entered) {
            tracing::debug!("registration passcode mismatch");
            return Err(Error::InvalidOtp);
        }

        let pending: PendingRegistration = self
            .stores
            .session
            .get_json(PENDING_REGISTRATION)?
            .ok_or(Error::NoPendingVerification)?;

        let user = User {
            user_id: generate_user_id(),
            name: pending.name,
            email: pending.email,
            password: pending.password,
            phone: pending.phone,
            user_type: UserType::Customer,
            verified: true,
            registered_date: crate::time::now(),
            membership: None,
            points: 0,
            service_history: Vec::new(),
        };
        self.users.save(user.clone())?;
        self.stores.session.remove(REGISTRATION_OTP)?;
        self.stores.session.remove(PENDING_REGISTRATION)?;
        tracing::info!(user_id = %user.user_id, "registration committed");

        Ok(user)
    }

    pub fn resend_otp(&self) -> Result<OtpChallenge> {
        let pending: PendingRegistration = self
            .stores
            .session
            .get_json(PENDING_REGISTRATION)?
            .ok_or(Error::NoPendingVerification)?;
        let otp = generate_otp();
        self.stores.session.set_raw(REGISTRATION_OTP, &otp)?;
        Ok(OtpChallenge {
            email: pending.email,
            otp,
        })
    }

    pub fn pending(&self) -> Result<Option<PendingRegistration>> {
        Ok(self.stores.session.get_json(PENDING_REGISTRATION)?)
    }
}
