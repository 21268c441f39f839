//! Session cookie configuration.

const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

pub const SESSION_COOKIE_NAME: &str = "sample_app_session";

#[derive(Clone, Debug)]
pub struct SessionConfig {
    ttl_seconds: i64,
    secure_cookies: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            secure_cookies: false,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ttl_seconds(mut self, seconds: i64) -> Self {
        self.ttl_seconds = seconds;
        self
    }

    /// Mark cookies `Secure`; enable when the app is served over HTTPS.
    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    /// `Set-Cookie` value carrying a session token.
    #[must_use]
    pub fn session_cookie(&self, token: &str) -> String {
        self.cookie(token, self.ttl_seconds)
    }

    /// `Set-Cookie` value that makes the browser drop the session cookie.
    #[must_use]
    pub fn clear_cookie(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{SESSION_COOKIE_NAME}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
        );
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_one_week_insecure() {
        let config = SessionConfig::new();
        assert_eq!(config.ttl_seconds(), 604_800);
        assert!(!config.secure_cookies());
    }

    #[test]
    fn session_cookie_attributes() {
        let config = SessionConfig::new().with_ttl_seconds(60);
        assert_eq!(
            config.session_cookie("abc"),
            "sample_app_session=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=60"
        );
    }

    #[test]
    fn secure_flag_applies_to_both_cookies() {
        let config = SessionConfig::new().with_secure_cookies(true);
        assert!(config.session_cookie("abc").ends_with("; Secure"));
        assert_eq!(
            config.clear_cookie(),
            "sample_app_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure"
        );
    }
}
