//! Login and logout.

use axum::{
    Form, Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{Html, IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{header_value, internal_error, session_token};
use crate::api::{config::SessionConfig, views};
use crate::auth::{AuthOutcome, Credential, Flash, LoginForm, SessionAuthenticator, SessionState};

/// Login form fields. Intentionally not `Debug`: it carries the plaintext password.
#[derive(ToSchema, Deserialize)]
pub struct SessionForm {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

#[utoipa::path(
    get,
    path = "/login",
    responses(
        (status = 200, description = "Login form", body = String, content_type = "text/html")
    ),
    tag = "sessions"
)]
pub async fn new_session(
    Extension(authenticator): Extension<Arc<SessionAuthenticator>>,
) -> impl IntoResponse {
    let form = authenticator.present_new_form();
    Html(views::login_page(&form, &[]))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body(content = SessionForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in; redirect to the user's profile"),
        (status = 200, description = "Invalid email/password combination; form re-rendered", body = String, content_type = "text/html"),
        (status = 500, description = "Directory or session store failure", body = String)
    ),
    tag = "sessions"
)]
pub async fn create_session(
    headers: HeaderMap,
    Extension(authenticator): Extension<Arc<SessionAuthenticator>>,
    Extension(config): Extension<SessionConfig>,
    Form(form): Form<SessionForm>,
) -> Response {
    let credential = Credential::new(form.email, SecretString::from(form.password));
    let previous = session_token(&headers);
    let mut flash = Flash::new();

    let outcome = match authenticator
        .authenticate(&credential, &mut flash, previous.as_ref())
        .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("Failed to authenticate: {err:#}");
            return internal_error();
        }
    };

    match outcome {
        AuthOutcome::Success {
            session,
            redirect_to,
            ..
        } => match header_value(&config.session_cookie(session.as_str())) {
            Ok(cookie) => ([(SET_COOKIE, cookie)], Redirect::to(&redirect_to)).into_response(),
            Err(response) => response,
        },
        AuthOutcome::Failure(_) => {
            let form = LoginForm {
                email: credential.email().to_string(),
            };
            (
                StatusCode::OK,
                Html(views::login_page(&form, &flash.take())),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/logout",
    responses(
        (status = 303, description = "Session cleared; redirect to the home page"),
        (status = 500, description = "Session store failure", body = String)
    ),
    tag = "sessions"
)]
pub async fn destroy_session(
    headers: HeaderMap,
    Extension(authenticator): Extension<Arc<SessionAuthenticator>>,
    Extension(config): Extension<SessionConfig>,
) -> Response {
    let token = session_token(&headers);
    if let Err(err) = authenticator.end_session(token.as_ref()).await {
        error!("Failed to end session: {err:#}");
        return internal_error();
    }

    // Clear the cookie even if the session record was missing.
    match header_value(&config.clear_cookie()) {
        Ok(cookie) => ([(SET_COOKIE, cookie)], Redirect::to("/")).into_response(),
        Err(response) => response,
    }
}

#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session"),
        (status = 500, description = "Directory or session store failure", body = String)
    ),
    tag = "sessions"
)]
pub async fn current_session(
    headers: HeaderMap,
    Extension(authenticator): Extension<Arc<SessionAuthenticator>>,
) -> Response {
    let token = session_token(&headers);
    match authenticator.current_session(token.as_ref()).await {
        Ok(SessionState::Authenticated(user)) => {
            let response = SessionResponse {
                user_id: user.id,
                name: user.name,
                email: user.email,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(SessionState::Anonymous) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("Failed to lookup session: {err:#}");
            internal_error()
        }
    }
}
