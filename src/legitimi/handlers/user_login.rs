use crate::auth;
use crate::legitimi::handlers::{error_response, valid_password, valid_username};
use crate::store::CredentialStore;
use crate::token::TokenCodec;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserLogin {
    username: String,
    password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/user/login",
    request_body = UserLogin,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse, content_type = "application/json"),
        (status = 400, description = "Missing or invalid payload"),
        (status = 401, description = "Unauthorized"),
    ),
    tag = "user"
)]
#[instrument(skip(store, codec, payload))]
pub async fn login(
    Extension(store): Extension<Arc<dyn CredentialStore>>,
    Extension(codec): Extension<Arc<TokenCodec>>,
    payload: Option<Json<UserLogin>>,
) -> Response {
    let user: UserLogin = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    debug!(username = %user.username, "login request");

    if !valid_username(&user.username) {
        return (StatusCode::BAD_REQUEST, "Invalid username".to_string()).into_response();
    }

    if !valid_password(&user.password) {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string()).into_response();
    }

    match auth::authenticate(store.as_ref(), &codec, &user.username, &user.password).await {
        Ok(token) => (StatusCode::OK, Json(TokenResponse { token })).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
