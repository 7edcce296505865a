//! Token-gated account endpoints.
//!
//! The token travels as a query parameter on reads and in the JSON body on
//! writes; either way it is handed to the session layer untouched.

use crate::auth::session;
use crate::legitimi::handlers::error_response;
use crate::store::CredentialStore;
use crate::token::TokenCodec;
use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

#[derive(IntoParams, Debug, Deserialize)]
#[into_params(parameter_in = Query)]
pub struct StatusParams {
    token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AccountResponse {
    pub name: String,
    pub profile: Option<String>,
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ModifyRequest {
    token: String,
    new_name: Option<String>,
    new_profile: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct DeleteRequest {
    token: String,
    #[serde(default)]
    confirm: bool,
}

#[utoipa::path(
    get,
    path = "/user/status",
    params(StatusParams),
    responses(
        (status = 200, description = "Resolved account", body = AccountResponse, content_type = "application/json"),
        (status = 401, description = "Unauthorized"),
    ),
    tag = "user"
)]
#[instrument(skip_all)]
pub async fn status(
    Query(params): Query<StatusParams>,
    Extension(store): Extension<Arc<dyn CredentialStore>>,
    Extension(codec): Extension<Arc<TokenCodec>>,
) -> Response {
    match session::status(store.as_ref(), &codec, &params.token).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(AccountResponse {
                name: outcome.account.name,
                profile: outcome.account.profile,
                token: outcome.token,
            }),
        )
            .into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/user/modify",
    request_body = ModifyRequest,
    responses(
        (status = 200, description = "Account updated; response carries the replacement token", body = AccountResponse, content_type = "application/json"),
        (status = 400, description = "Missing payload"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Requested name already taken"),
    ),
    tag = "user"
)]
#[instrument(skip_all)]
pub async fn modify(
    Extension(store): Extension<Arc<dyn CredentialStore>>,
    Extension(codec): Extension<Arc<TokenCodec>>,
    payload: Option<Json<ModifyRequest>>,
) -> Response {
    let request: ModifyRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match session::modify(
        store.as_ref(),
        &codec,
        &request.token,
        request.new_name.as_deref(),
        request.new_profile.as_deref(),
    )
    .await
    {
        Ok(outcome) => (
            StatusCode::OK,
            Json(AccountResponse {
                name: outcome.account.name,
                profile: outcome.account.profile,
                token: outcome.token,
            }),
        )
            .into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/user/delete",
    request_body = DeleteRequest,
    responses(
        (status = 200, description = "Account removed"),
        (status = 400, description = "Missing payload or confirmation"),
        (status = 401, description = "Unauthorized"),
    ),
    tag = "user"
)]
#[instrument(skip_all)]
pub async fn delete(
    Extension(store): Extension<Arc<dyn CredentialStore>>,
    Extension(codec): Extension<Arc<TokenCodec>>,
    payload: Option<Json<DeleteRequest>>,
) -> Response {
    let request: DeleteRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match session::delete(store.as_ref(), &codec, &request.token, request.confirm).await {
        Ok(()) => (StatusCode::OK, "User deleted".to_string()).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{authenticate, register};
    use crate::store::MemoryStore;
    use secrecy::SecretString;

    struct Fixture {
        store: Extension<Arc<dyn CredentialStore>>,
        codec: Extension<Arc<TokenCodec>>,
        token: String,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        register(&store, "alice", "pw1", Some("first user"))
            .await
            .expect("register alice");

        let codec = Arc::new(TokenCodec::new(SecretString::from("test-signing-secret")));
        let token = authenticate(&store, &codec, "alice", "pw1")
            .await
            .expect("login alice");

        Fixture {
            store: Extension(Arc::new(store) as Arc<dyn CredentialStore>),
            codec: Extension(codec),
            token,
        }
    }

    async fn account_from(response: Response) -> AccountResponse {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("account response")
    }

    #[tokio::test]
    async fn status_returns_account_and_echoes_token() {
        let fixture = fixture().await;
        let response = status(
            Query(StatusParams {
                token: fixture.token.clone(),
            }),
            fixture.store,
            fixture.codec,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let account = account_from(response).await;
        assert_eq!(account.name, "alice");
        assert_eq!(account.profile.as_deref(), Some("first user"));
        assert_eq!(account.token, fixture.token);
    }

    #[tokio::test]
    async fn status_unauthorized_for_garbage_token() {
        let fixture = fixture().await;
        let response = status(
            Query(StatusParams {
                token: "garbage".to_string(),
            }),
            fixture.store,
            fixture.codec,
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn modify_returns_replacement_token() {
        let fixture = fixture().await;
        let response = modify(
            fixture.store.clone(),
            fixture.codec.clone(),
            Some(Json(ModifyRequest {
                token: fixture.token.clone(),
                new_name: Some("alicia".to_string()),
                new_profile: None,
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let account = account_from(response).await;
        assert_eq!(account.name, "alicia");
        assert_ne!(account.token, fixture.token);

        // The old token is dead after the rename.
        let response = status(
            Query(StatusParams {
                token: fixture.token,
            }),
            fixture.store,
            fixture.codec,
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let fixture = fixture().await;
        let response = delete(
            fixture.store.clone(),
            fixture.codec.clone(),
            Some(Json(DeleteRequest {
                token: fixture.token.clone(),
                confirm: false,
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = delete(
            fixture.store.clone(),
            fixture.codec.clone(),
            Some(Json(DeleteRequest {
                token: fixture.token.clone(),
                confirm: true,
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = status(
            Query(StatusParams {
                token: fixture.token,
            }),
            fixture.store,
            fixture.codec,
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
