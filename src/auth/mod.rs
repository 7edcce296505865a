//! Registration and login.
//!
//! Orchestrates the credential store and the token codec: `register` creates
//! records, `authenticate` verifies a pair and mints a token bound to it.
//! Token-gated operations live in [`session`].

pub mod session;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::store::{CredentialStore, NewUser, StoreError};
use crate::token::{Claims, TokenCodec, TokenError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username already taken")]
    UsernameTaken,

    #[error("invalid username or password")]
    InvalidCredentials,

    // The two token failures share one message on purpose: a caller cannot
    // tell a malformed token from one whose claims no longer match a live
    // record.
    #[error("invalid token")]
    InvalidToken,

    #[error("invalid token")]
    StaleOrUnknownToken,

    #[error("confirmation required")]
    ConfirmationRequired,

    #[error("token encoding failed")]
    TokenEncoding(#[source] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Create a new identity record. No token is issued; registration and login
/// are separate steps.
///
/// # Errors
///
/// Fails with [`AuthError::UsernameTaken`] when the name is already live,
/// whether seen by the pre-check or by the store's own uniqueness constraint.
#[instrument(skip(store, password, profile))]
pub async fn register<S>(
    store: &S,
    username: &str,
    password: &str,
    profile: Option<&str>,
) -> Result<(), AuthError>
where
    S: CredentialStore + ?Sized,
{
    if store.find_by_name(username).await?.is_some() {
        debug!("username already registered");
        return Err(AuthError::UsernameTaken);
    }

    let user = NewUser {
        name: username.to_string(),
        credential: password.to_string(),
        profile: profile.map(str::to_string),
    };

    match store.insert(user).await {
        Ok(_) => Ok(()),
        // Lost the race to a concurrent registration; same outcome.
        Err(StoreError::Duplicate) => Err(AuthError::UsernameTaken),
        Err(err) => Err(AuthError::Store(err)),
    }
}

/// Verify a username/password pair and mint a token bound to it.
///
/// The lookup is credential-qualified; a name-only hit with the wrong
/// password is indistinguishable from an unknown name.
///
/// # Errors
///
/// Fails with [`AuthError::InvalidCredentials`] when no live record matches
/// the pair exactly.
#[instrument(skip(store, codec, password))]
pub async fn authenticate<S>(
    store: &S,
    codec: &TokenCodec,
    username: &str,
    password: &str,
) -> Result<String, AuthError>
where
    S: CredentialStore + ?Sized,
{
    let record = store
        .find_by_name_and_credential(username, password)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let claims = Claims {
        name: record.name,
        credential: password.to_string(),
    };
    codec.encode(&claims).map_err(AuthError::TokenEncoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use secrecy::SecretString;

    fn codec() -> TokenCodec {
        TokenCodec::new(SecretString::from("test-signing-secret"))
    }

    #[tokio::test]
    async fn register_then_authenticate() -> Result<(), AuthError> {
        let store = MemoryStore::new();
        let codec = codec();

        register(&store, "alice", "pw1", Some("first user")).await?;
        let token = authenticate(&store, &codec, "alice", "pw1").await?;

        let claims = codec.decode(&token).map_err(|_| AuthError::InvalidToken)?;
        assert_eq!(claims.name, "alice");
        assert_eq!(claims.credential, "pw1");
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_taken_username_regardless_of_password() -> Result<(), AuthError> {
        let store = MemoryStore::new();

        register(&store, "alice", "pw1", None).await?;
        assert!(matches!(
            register(&store, "alice", "pw2", None).await,
            Err(AuthError::UsernameTaken)
        ));

        // The original credential still wins; the failed attempt changed nothing.
        let codec = codec();
        assert!(authenticate(&store, &codec, "alice", "pw1").await.is_ok());
        assert!(matches!(
            authenticate(&store, &codec, "alice", "pw2").await,
            Err(AuthError::InvalidCredentials)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_requires_exact_pair() -> Result<(), AuthError> {
        let store = MemoryStore::new();
        let codec = codec();

        register(&store, "alice", "pw1", None).await?;

        assert!(matches!(
            authenticate(&store, &codec, "alice", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&store, &codec, "bob", "pw1").await,
            Err(AuthError::InvalidCredentials)
        ));
        Ok(())
    }

    #[test]
    fn token_failures_share_wording() {
        assert_eq!(
            AuthError::InvalidToken.to_string(),
            AuthError::StaleOrUnknownToken.to_string()
        );
    }
}
