use axum::http::{HeaderMap, HeaderValue, header};
use chrono::{DateTime, Utc};
use cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;

use crate::{
    cipher::{Cipher, CipherError},
    models::SessionPayload,
};

/// Cookie carrying the raw remember-me token.
pub const TOKEN_COOKIE: &str = "admin_token";
/// Cookie carrying the encrypted `SessionPayload`.
pub const SESSION_COOKIE: &str = "admin_session";

#[derive(Debug, Error)]
pub enum CookieError {
    /// The cookie is present but could not be decrypted or decoded. Distinct from absence.
    #[error("cookie `{name}` is present but invalid: {reason}")]
    InvalidCookie { name: &'static str, reason: String },

    #[error("failed to encode cookie payload: {0}")]
    Encode(String),
}

/// CookieStore
///
/// Request-scoped view of the browser's cookies. Reads come from the incoming `Cookie`
/// header; writes and removals are recorded as a delta and rendered into `Set-Cookie`
/// headers by the dispatcher once the request completes.
///
/// Every cookie written here carries the same attributes: `Path=/`, `HttpOnly`,
/// `SameSite=Lax`, and `Secure` unless the request came in on a loopback host.
#[derive(Debug, Clone)]
pub struct CookieStore {
    jar: CookieJar,
    cipher: Arc<Cipher>,
    secure: bool,
}

impl CookieStore {
    pub fn new(cipher: Arc<Cipher>, secure: bool) -> Self {
        Self {
            jar: CookieJar::new(),
            cipher,
            secure,
        }
    }

    /// from_headers
    ///
    /// Seeds the jar with every cookie found in the request's `Cookie` headers.
    /// Unparseable pairs are skipped.
    pub fn from_headers(headers: &HeaderMap, cipher: Arc<Cipher>, secure: bool) -> Self {
        let mut store = Self::new(cipher, secure);
        for value in headers.get_all(header::COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            for parsed in Cookie::split_parse(raw.to_owned()).flatten() {
                store.jar.add_original(parsed);
            }
        }
        store
    }

    /// Current value of a cookie, reflecting writes made during this request.
    /// Cookies cleared during the request read as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.jar
            .get(name)
            .map(Cookie::value)
            .filter(|value| !value.is_empty())
    }

    pub fn set_persistent_token(&mut self, token: &str, expires_at: DateTime<Utc>) {
        let cookie = self.build(TOKEN_COOKIE, token.to_owned(), expires_at);
        self.jar.add(cookie);
    }

    /// set_encrypted_session
    ///
    /// JSON-encodes the payload, encrypts it and stores it in `admin_session`.
    pub fn set_encrypted_session(
        &mut self,
        payload: &SessionPayload,
        expires_at: DateTime<Utc>,
    ) -> Result<(), CookieError> {
        let json = serde_json::to_vec(payload).map_err(|e| CookieError::Encode(e.to_string()))?;
        let sealed = self
            .cipher
            .encrypt(&json)
            .map_err(|e: CipherError| CookieError::Encode(e.to_string()))?;

        let cookie = self.build(SESSION_COOKIE, sealed, expires_at);
        self.jar.add(cookie);
        Ok(())
    }

    /// get_decrypted_session
    ///
    /// `Ok(None)` when there is no `admin_session` cookie, including an empty value as left
    /// behind by a cleared cookie. `Err(InvalidCookie)` when it is
    /// present but fails decryption or does not decode into a complete `SessionPayload`.
    /// Expiry is not checked here; callers decide what an expired payload means.
    pub fn get_decrypted_session(&self) -> Result<Option<SessionPayload>, CookieError> {
        let Some(sealed) = self.get(SESSION_COOKIE) else {
            return Ok(None);
        };

        let json = self
            .cipher
            .decrypt(sealed)
            .map_err(|e| CookieError::InvalidCookie {
                name: SESSION_COOKIE,
                reason: e.to_string(),
            })?;

        serde_json::from_slice::<SessionPayload>(&json)
            .map(Some)
            .map_err(|e| CookieError::InvalidCookie {
                name: SESSION_COOKIE,
                reason: e.to_string(),
            })
    }

    /// clear_cookie
    ///
    /// Overwrites the cookie with an empty value that expired at the UNIX epoch, using the
    /// same path and flags it was set with so browsers drop it.
    pub fn clear_cookie(&mut self, name: &'static str) {
        let cookie = Cookie::build((name, ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(time::Duration::ZERO)
            .build();
        self.jar.add(cookie);
    }

    /// Cookies written or cleared during this request.
    pub fn changes(&self) -> impl Iterator<Item = &Cookie<'static>> {
        self.jar.delta()
    }

    /// Renders the pending changes as `Set-Cookie` header values.
    pub fn set_cookie_headers(&self) -> Vec<HeaderValue> {
        self.changes()
            .filter_map(|cookie| HeaderValue::from_str(&cookie.to_string()).ok())
            .collect()
    }

    fn build(&self, name: &'static str, value: String, expires_at: DateTime<Utc>) -> Cookie<'static> {
        let expires = OffsetDateTime::from_unix_timestamp(expires_at.timestamp())
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);

        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .expires(expires)
            .build()
    }
}

/// is_loopback_host
///
/// True for `localhost` and loopback IP literals, with or without a port
/// (`127.0.0.1:3000`, `[::1]:8080`).
pub fn is_loopback_host(host: &str) -> bool {
    let host = host.trim();
    let bare = if let Some(rest) = host.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else if host.matches(':').count() == 1 {
        host.split(':').next().unwrap_or(host)
    } else {
        host
    };

    if bare.eq_ignore_ascii_case("localhost") {
        return true;
    }
    bare.parse::<std::net::IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}
