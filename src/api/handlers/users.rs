use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use super::internal_error;
use crate::api::views;
use crate::auth::SessionAuthenticator;

#[utoipa::path(
    get,
    path = "/signup",
    responses(
        (status = 200, description = "Signup page", body = String, content_type = "text/html")
    ),
    tag = "users"
)]
pub async fn new_user() -> impl IntoResponse {
    Html(views::signup_page())
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User profile", body = String, content_type = "text/html"),
        (status = 404, description = "No such user", body = String)
    ),
    tag = "users"
)]
pub async fn show_user(
    Path(id): Path<String>,
    Extension(authenticator): Extension<Arc<SessionAuthenticator>>,
) -> Response {
    // Malformed ids are just another way of naming a user that doesn't exist.
    let Ok(id) = Uuid::parse_str(&id) else {
        debug!("Invalid user id: {id}");
        return not_found();
    };

    match authenticator.directory().find_by_id(id).await {
        Ok(Some(user)) => Html(views::user_page(&user)).into_response(),
        Ok(None) => not_found(),
        Err(err) => {
            error!("Failed to lookup user: {err:#}");
            internal_error()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found".to_string()).into_response()
}
