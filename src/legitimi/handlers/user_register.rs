use crate::auth;
use crate::legitimi::handlers::{error_response, valid_password, valid_username};
use crate::store::CredentialStore;
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserRegister {
    username: String,
    password: String,
    profile: Option<String>,
}

#[utoipa::path(
    post,
    path = "/user/register",
    request_body = UserRegister,
    responses(
        (status = 201, description = "Registration successful"),
        (status = 400, description = "Missing or invalid payload"),
        (status = 409, description = "User with the specified username already exists"),
    ),
    tag = "user"
)]
#[instrument(skip(store, payload))]
pub async fn register(
    Extension(store): Extension<Arc<dyn CredentialStore>>,
    payload: Option<Json<UserRegister>>,
) -> impl IntoResponse {
    let user: UserRegister = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()),
    };

    debug!(username = %user.username, "register request");

    if !valid_username(&user.username) {
        return (StatusCode::BAD_REQUEST, "Invalid username".to_string());
    }

    if !valid_password(&user.password) {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string());
    }

    match auth::register(
        store.as_ref(),
        &user.username,
        &user.password,
        user.profile.as_deref(),
    )
    .await
    {
        Ok(()) => (StatusCode::CREATED, "User created".to_string()),
        Err(err) => error_response(&err),
    }
}
