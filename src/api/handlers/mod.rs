//! Route handlers and the helpers they share.

pub mod health;
pub mod root;
pub mod sessions;
pub mod users;

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode, header::COOKIE},
    response::{IntoResponse, Response},
};
use tracing::error;

use super::config::SESSION_COOKIE_NAME;
use crate::auth::SessionToken;

/// Session token from the request's cookie header, if present.
pub(crate) fn session_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            if key.trim() == SESSION_COOKIE_NAME {
                SessionToken::from_presented(val)
            } else {
                None
            }
        })
}

/// Header value from a string we built ourselves; failures are logged and
/// surface as a 500.
pub(crate) fn header_value(value: &str) -> Result<HeaderValue, Response> {
    HeaderValue::from_str(value).map_err(|err| {
        error!("Failed to build header value: {err}");
        internal_error()
    })
}

pub(crate) fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookie: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static(cookie));
        headers
    }

    #[test]
    fn session_token_found_among_other_cookies() {
        let token = session_token(&headers("theme=dark; sample_app_session=abc123; lang=en"));
        assert_eq!(token.map(|t| t.as_str().to_string()), Some("abc123".to_string()));
    }

    #[test]
    fn session_token_missing_or_blank() {
        assert!(session_token(&HeaderMap::new()).is_none());
        assert!(session_token(&headers("theme=dark")).is_none());
        assert!(session_token(&headers("sample_app_session=")).is_none());
    }

    #[test]
    fn session_token_ignores_prefixed_names() {
        assert!(session_token(&headers("other_sample_app_session=abc")).is_none());
    }

    #[test]
    fn header_value_rejects_control_characters() {
        assert!(header_value("ok").is_ok());
        assert!(header_value("bad\nvalue").is_err());
    }
}
