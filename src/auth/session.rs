//! Token-gated operations on the holder's own record.
//!
//! Every operation re-resolves the token's claims against the live store
//! before acting; a token is never trusted as a cached grant. Changing the
//! credential pair (rename, delete) invalidates every token minted for the
//! old pair.

use tracing::{debug, instrument};

use super::AuthError;
use crate::store::{CredentialStore, StoreError, UserRecord};
use crate::token::{Claims, TokenCodec};

/// Public view of a resolved record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountView {
    pub name: String,
    pub profile: Option<String>,
}

impl From<UserRecord> for AccountView {
    fn from(record: UserRecord) -> Self {
        Self {
            name: record.name,
            profile: record.profile,
        }
    }
}

/// Result of [`status`]: the resolved view plus the same token, echoed.
#[derive(Debug)]
pub struct StatusOutcome {
    pub account: AccountView,
    pub token: String,
}

/// Result of [`modify`]: the updated view plus a replacement token.
///
/// The old token stays valid only if the name did not change; callers should
/// switch to the returned token either way.
#[derive(Debug)]
pub struct ModifyOutcome {
    pub account: AccountView,
    pub token: String,
}

/// Shared preamble: decode the token, then re-resolve its claims against the
/// current store state.
async fn resolve<S>(
    store: &S,
    codec: &TokenCodec,
    token: &str,
) -> Result<(UserRecord, Claims), AuthError>
where
    S: CredentialStore + ?Sized,
{
    let claims = codec.decode(token).map_err(|err| {
        debug!("token rejected: {err}");
        AuthError::InvalidToken
    })?;

    let record = store
        .find_by_name_and_credential(&claims.name, &claims.credential)
        .await?
        .ok_or(AuthError::StaleOrUnknownToken)?;

    Ok((record, claims))
}

/// Read the token-holder's record. Idempotent; echoes the token unchanged.
///
/// # Errors
///
/// Fails with [`AuthError::InvalidToken`] on a malformed or unsigned token
/// and [`AuthError::StaleOrUnknownToken`] when the claims no longer match a
/// live record.
#[instrument(skip(store, codec, token))]
pub async fn status<S>(
    store: &S,
    codec: &TokenCodec,
    token: &str,
) -> Result<StatusOutcome, AuthError>
where
    S: CredentialStore + ?Sized,
{
    let (record, _) = resolve(store, codec, token).await?;
    Ok(StatusOutcome {
        account: record.into(),
        token: token.to_string(),
    })
}

/// Apply provided, non-empty field overrides to the token-holder's record
/// and mint a replacement token.
///
/// Renames are checked against live names before the update, and the store's
/// uniqueness constraint backstops the racy window between check and update.
/// The credential is never touched here, so the new token differs from the
/// old one only when the name changed.
///
/// # Errors
///
/// Token failures as in [`status`]; a rename collision fails with
/// [`AuthError::UsernameTaken`].
#[instrument(skip(store, codec, token, new_profile))]
pub async fn modify<S>(
    store: &S,
    codec: &TokenCodec,
    token: &str,
    new_name: Option<&str>,
    new_profile: Option<&str>,
) -> Result<ModifyOutcome, AuthError>
where
    S: CredentialStore + ?Sized,
{
    let (mut record, claims) = resolve(store, codec, token).await?;

    if let Some(name) = provided(new_name) {
        if name != record.name {
            if store.find_by_name(name).await?.is_some() {
                return Err(AuthError::UsernameTaken);
            }
            record.name = name.to_string();
        }
    }
    if let Some(profile) = provided(new_profile) {
        record.profile = Some(profile.to_string());
    }

    match store.update(&record).await {
        Ok(()) => {}
        Err(StoreError::Duplicate) => return Err(AuthError::UsernameTaken),
        // The record vanished between resolve and update.
        Err(StoreError::NotFound) => return Err(AuthError::StaleOrUnknownToken),
        Err(err) => return Err(AuthError::Store(err)),
    }

    let claims = Claims {
        name: record.name.clone(),
        credential: claims.credential,
    };
    let token = codec.encode(&claims).map_err(AuthError::TokenEncoding)?;

    Ok(ModifyOutcome {
        account: record.into(),
        token,
    })
}

/// Remove the token-holder's record.
///
/// The confirmation flag is checked before the token is even parsed; an
/// unconfirmed delete never touches the codec or the store. Removal itself is
/// a single atomic credential-qualified delete, so there is no window between
/// verification and removal.
///
/// # Errors
///
/// Fails with [`AuthError::ConfirmationRequired`] when unconfirmed; token
/// failures as in [`status`].
#[instrument(skip(store, codec, token))]
pub async fn delete<S>(
    store: &S,
    codec: &TokenCodec,
    token: &str,
    confirm: bool,
) -> Result<(), AuthError>
where
    S: CredentialStore + ?Sized,
{
    if !confirm {
        return Err(AuthError::ConfirmationRequired);
    }

    let claims = codec.decode(token).map_err(|err| {
        debug!("token rejected: {err}");
        AuthError::InvalidToken
    })?;

    store
        .delete_by_name_and_credential(&claims.name, &claims.credential)
        .await?
        .map(|_| ())
        .ok_or(AuthError::StaleOrUnknownToken)
}

/// Treat missing and empty/whitespace values the same: not provided.
fn provided(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{authenticate, register};
    use crate::store::MemoryStore;
    use secrecy::SecretString;

    fn codec() -> TokenCodec {
        TokenCodec::new(SecretString::from("test-signing-secret"))
    }

    async fn store_with_alice() -> Result<MemoryStore, AuthError> {
        let store = MemoryStore::new();
        register(&store, "alice", "pw1", Some("first user")).await?;
        Ok(store)
    }

    #[tokio::test]
    async fn status_resolves_and_echoes_token() -> Result<(), AuthError> {
        let store = store_with_alice().await?;
        let codec = codec();
        let token = authenticate(&store, &codec, "alice", "pw1").await?;

        let outcome = status(&store, &codec, &token).await?;
        assert_eq!(outcome.account.name, "alice");
        assert_eq!(outcome.account.profile.as_deref(), Some("first user"));
        assert_eq!(outcome.token, token);

        // Idempotent: nothing changed, so a second call returns the same view.
        let again = status(&store, &codec, &token).await?;
        assert_eq!(again.account, outcome.account);
        Ok(())
    }

    #[tokio::test]
    async fn status_rejects_garbage_and_foreign_tokens() -> Result<(), AuthError> {
        let store = store_with_alice().await?;
        let codec = codec();

        assert!(matches!(
            status(&store, &codec, "garbage").await,
            Err(AuthError::InvalidToken)
        ));

        // Correctly signed, but by a different deployment's secret.
        let other = TokenCodec::new(SecretString::from("other-secret"));
        let foreign = authenticate(&store, &other, "alice", "pw1").await?;
        assert!(matches!(
            status(&store, &codec, &foreign).await,
            Err(AuthError::InvalidToken)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn rename_invalidates_old_token_and_issues_new_one() -> Result<(), AuthError> {
        let store = store_with_alice().await?;
        let codec = codec();
        let token = authenticate(&store, &codec, "alice", "pw1").await?;

        let outcome = modify(&store, &codec, &token, Some("alicia"), None).await?;
        assert_eq!(outcome.account.name, "alicia");
        assert_ne!(outcome.token, token);

        // Old claims name no longer matches a live record.
        assert!(matches!(
            status(&store, &codec, &token).await,
            Err(AuthError::StaleOrUnknownToken)
        ));

        let fresh = status(&store, &codec, &outcome.token).await?;
        assert_eq!(fresh.account.name, "alicia");
        assert_eq!(fresh.account.profile.as_deref(), Some("first user"));
        Ok(())
    }

    #[tokio::test]
    async fn profile_change_keeps_old_token_valid() -> Result<(), AuthError> {
        let store = store_with_alice().await?;
        let codec = codec();
        let token = authenticate(&store, &codec, "alice", "pw1").await?;

        let outcome = modify(&store, &codec, &token, None, Some("updated")).await?;
        assert_eq!(outcome.account.profile.as_deref(), Some("updated"));
        // Name and credential are unchanged, so the claims are identical.
        assert_eq!(outcome.token, token);

        let view = status(&store, &codec, &token).await?;
        assert_eq!(view.account.profile.as_deref(), Some("updated"));
        Ok(())
    }

    #[tokio::test]
    async fn empty_overrides_are_not_applied() -> Result<(), AuthError> {
        let store = store_with_alice().await?;
        let codec = codec();
        let token = authenticate(&store, &codec, "alice", "pw1").await?;

        let outcome = modify(&store, &codec, &token, Some("  "), Some("")).await?;
        assert_eq!(outcome.account.name, "alice");
        assert_eq!(outcome.account.profile.as_deref(), Some("first user"));
        assert_eq!(outcome.token, token);
        Ok(())
    }

    #[tokio::test]
    async fn rename_onto_live_name_is_rejected() -> Result<(), AuthError> {
        let store = store_with_alice().await?;
        register(&store, "bob", "pw2", None).await?;
        let codec = codec();
        let token = authenticate(&store, &codec, "bob", "pw2").await?;

        assert!(matches!(
            modify(&store, &codec, &token, Some("alice"), None).await,
            Err(AuthError::UsernameTaken)
        ));

        // Bob is untouched and his token still resolves.
        let view = status(&store, &codec, &token).await?;
        assert_eq!(view.account.name, "bob");
        Ok(())
    }

    #[tokio::test]
    async fn rename_to_own_name_is_a_no_op() -> Result<(), AuthError> {
        let store = store_with_alice().await?;
        let codec = codec();
        let token = authenticate(&store, &codec, "alice", "pw1").await?;

        let outcome = modify(&store, &codec, &token, Some("alice"), None).await?;
        assert_eq!(outcome.account.name, "alice");
        assert_eq!(outcome.token, token);
        Ok(())
    }

    #[tokio::test]
    async fn unconfirmed_delete_never_parses_the_token() -> Result<(), AuthError> {
        let store = store_with_alice().await?;
        let codec = codec();

        // Not even well-formed, and still the confirmation gate answers first.
        assert!(matches!(
            delete(&store, &codec, "not-a-token", false).await,
            Err(AuthError::ConfirmationRequired)
        ));

        let token = authenticate(&store, &codec, "alice", "pw1").await?;
        assert!(matches!(
            delete(&store, &codec, &token, false).await,
            Err(AuthError::ConfirmationRequired)
        ));
        assert!(status(&store, &codec, &token).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn confirmed_delete_removes_record_and_tokens_die_with_it() -> Result<(), AuthError> {
        let store = store_with_alice().await?;
        let codec = codec();
        let token = authenticate(&store, &codec, "alice", "pw1").await?;

        delete(&store, &codec, &token, true).await?;

        assert!(matches!(
            status(&store, &codec, &token).await,
            Err(AuthError::StaleOrUnknownToken)
        ));
        assert!(matches!(
            authenticate(&store, &codec, "alice", "pw1").await,
            Err(AuthError::InvalidCredentials)
        ));

        // Deleting again with the same token finds nothing.
        assert!(matches!(
            delete(&store, &codec, &token, true).await,
            Err(AuthError::StaleOrUnknownToken)
        ));
        Ok(())
    }
}
