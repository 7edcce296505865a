pub mod health;
pub use self::health::health;

pub mod user_register;
pub use self::user_register::register;

pub mod user_login;
pub use self::user_login::login;

pub mod account;

// common functions for the handlers
use crate::auth::AuthError;
use axum::http::StatusCode;
use regex::Regex;
use tracing::error;

pub fn valid_username(username: &str) -> bool {
    Regex::new(r"^[A-Za-z0-9_.-]{1,64}$").is_ok_and(|re| re.is_match(username))
}

pub fn valid_password(password: &str) -> bool {
    !password.is_empty() && password.len() <= 512
}

/// Map a service error to a transport response.
///
/// All 401 bodies are identical regardless of cause, so a caller cannot
/// distinguish a bad password from a malformed or stale token.
pub(crate) fn error_response(err: &AuthError) -> (StatusCode, String) {
    match err {
        AuthError::UsernameTaken => (StatusCode::CONFLICT, "User already exists".to_string()),
        AuthError::InvalidCredentials
        | AuthError::InvalidToken
        | AuthError::StaleOrUnknownToken => {
            (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
        }
        AuthError::ConfirmationRequired => (
            StatusCode::BAD_REQUEST,
            "Confirmation required".to_string(),
        ),
        AuthError::TokenEncoding(_) | AuthError::Store(_) => {
            error!("Internal error: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
            )
        }
    }
}
