use crate::auth::SessionAuthenticator;
use anyhow::Result;
use axum::{
    Extension, Json, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::get,
};
use std::{future::Future, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;

mod config;
pub(crate) mod handlers;
mod openapi;
pub mod views;

pub use config::{SESSION_COOKIE_NAME, SessionConfig};
pub use openapi::openapi;

use handlers::{health, root, sessions, users};

/// Build the application router.
///
/// Routes are the HTML pages, the session lookup, health, and the `OpenAPI`
/// document. The logout route also accepts `POST` so plain HTML forms can use it.
pub fn app(authenticator: Arc<SessionAuthenticator>, config: SessionConfig) -> Router {
    Router::new()
        .route("/", get(root::home))
        .route(
            "/login",
            get(sessions::new_session).post(sessions::create_session),
        )
        .route(
            "/logout",
            axum::routing::delete(sessions::destroy_session).post(sessions::destroy_session),
        )
        .route("/session", get(sessions::current_session))
        .route("/signup", get(users::new_user))
        .route("/users/:id", get(users::show_user))
        .route("/health", get(health::health))
        .route("/api-docs/openapi.json", get(|| async { Json(openapi()) }))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(authenticator))
                .layer(Extension(config)),
        )
}

/// Start the server and run until `shutdown` resolves.
/// # Errors
/// Return error if failed to bind or serve
pub async fn new<F>(
    port: u16,
    authenticator: Arc<SessionAuthenticator>,
    config: SessionConfig,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = app(authenticator, config);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
