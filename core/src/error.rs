//! Error types for the loyalty services.

use thiserror::Error;

use crate::models::UserType;

/// Result type alias using the core [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by a [`KeyValueStore`](crate::store::KeyValueStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage engine refused the operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored value could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Errors surfaced to the person driving a page.
///
/// Everything except [`Error::Store`] is user-correctable input; none of them
/// leave partially written state behind.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The account exists but was picked from the other login channel.
    #[error("{}", wrong_channel_message(*.selected))]
    WrongLoginChannel { selected: UserType, actual: UserType },

    #[error("Please verify your email first")]
    NotVerified,

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Email already registered")]
    EmailTaken,

    #[error("User not found")]
    UserNotFound,

    /// A field failed format validation before any check ran.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Verify or resend was called with no challenge staged in the session.
    #[error("No verification in progress")]
    NoPendingVerification,

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn wrong_channel_message(selected: UserType) -> &'static str {
    match selected {
        UserType::Admin => "Access denied. Admin credentials required.",
        UserType::Customer => "Please use Admin login",
    }
}

impl Error {
    /// True for errors the user can fix by changing their input.
    pub fn is_user_correctable(&self) -> bool {
        !matches!(self, Error::Store(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Store(StoreError::Codec(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_channel_messages_follow_selected_mode() {
        let admin_mode = Error::WrongLoginChannel {
            selected: UserType::Admin,
            actual: UserType::Customer,
        };
        assert_eq!(admin_mode.to_string(), "Access denied. Admin credentials required.");

        let customer_mode = Error::WrongLoginChannel {
            selected: UserType::Customer,
            actual: UserType::Admin,
        };
        assert_eq!(customer_mode.to_string(), "Please use Admin login");
    }

    #[test]
    fn store_errors_are_not_user_correctable() {
        assert!(Error::InvalidOtp.is_user_correctable());
        assert!(!Error::Store(StoreError::Backend("disk".into())).is_user_correctable());
    }
}
