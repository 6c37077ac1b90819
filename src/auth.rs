use chrono::{Duration, Utc};
use thiserror::Error;

use crate::{
    config::AppConfig,
    cookies::{CookieStore, SESSION_COOKIE, TOKEN_COOKIE},
    models::{PersistentToken, SessionPayload},
    repository::AdminRepositoryState,
    tokens::{TokenStoreError, TokenStoreState, generate_token},
};

// --- Password policy ---

/// A single password rule that a candidate failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    Required,
    MinLength(usize),
    Uppercase,
    Lowercase,
    Digit,
    Symbol,
}

impl PasswordRule {
    pub fn message(&self) -> String {
        match self {
            PasswordRule::Required => "Password is required.".to_string(),
            PasswordRule::MinLength(n) => format!("Password must be at least {n} characters."),
            PasswordRule::Uppercase => "Password must contain an uppercase letter.".to_string(),
            PasswordRule::Lowercase => "Password must contain a lowercase letter.".to_string(),
            PasswordRule::Digit => "Password must contain a digit.".to_string(),
            PasswordRule::Symbol => {
                "Password must contain a character that is not a letter or digit.".to_string()
            }
        }
    }
}

/// PasswordPolicyError
///
/// Structured validation failure: every violated rule plus a message fit to show on the
/// login form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct PasswordPolicyError {
    pub violations: Vec<PasswordRule>,
    pub message: String,
}

impl PasswordPolicyError {
    fn new(violations: Vec<PasswordRule>) -> Self {
        let message = violations
            .iter()
            .map(PasswordRule::message)
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            violations,
            message,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(PasswordRule::message).collect()
    }
}

/// PasswordPolicy
///
/// Strength rules applied to submitted passwords. The default requires at least eight
/// characters with an uppercase letter, a lowercase letter and a digit;
/// `require_symbol` additionally demands a non-alphanumeric character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_symbol: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_symbol: false,
        }
    }
}

impl PasswordPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            require_symbol: config.password_require_symbol,
            ..Self::default()
        }
    }

    pub fn validate(&self, password: &str) -> Result<(), PasswordPolicyError> {
        if password.is_empty() {
            return Err(PasswordPolicyError::new(vec![PasswordRule::Required]));
        }

        let mut violations = Vec::new();
        if password.chars().count() < self.min_length {
            violations.push(PasswordRule::MinLength(self.min_length));
        }
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            violations.push(PasswordRule::Uppercase);
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            violations.push(PasswordRule::Lowercase);
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            violations.push(PasswordRule::Digit);
        }
        if self.require_symbol && !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
            violations.push(PasswordRule::Symbol);
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(PasswordPolicyError::new(violations))
        }
    }
}

/// validate_password
///
/// Checks a password against the default [`PasswordPolicy`].
pub fn validate_password(password: &str) -> Result<(), PasswordPolicyError> {
    PasswordPolicy::default().validate(password)
}

// --- Authentication state ---

/// AuthState
///
/// What the request's cookies currently prove. A remember-me token is consulted first;
/// the encrypted session cookie is only read when there is no valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Persistent { admin_id: i64 },
    Session { admin_id: i64 },
    Unauthenticated,
    /// `admin_session` is present but failed decryption or decoding.
    InvalidSession,
}

impl AuthState {
    pub fn admin_id(&self) -> Option<i64> {
        match self {
            AuthState::Persistent { admin_id } | AuthState::Session { admin_id } => Some(*admin_id),
            AuthState::Unauthenticated | AuthState::InvalidSession => None,
        }
    }
}

/// AuthenticationService
///
/// Owns the login/logout state machine. A remember-me login is backed by a `TokenStore`
/// record plus the `admin_token` cookie; a plain login lives entirely in the encrypted
/// `admin_session` cookie and leaves nothing on the server.
pub struct AuthenticationService {
    admins: AdminRepositoryState,
    tokens: TokenStoreState,
    policy: PasswordPolicy,
    remember_for: Duration,
    session_for: Duration,
}

impl AuthenticationService {
    pub fn new(admins: AdminRepositoryState, tokens: TokenStoreState, config: &AppConfig) -> Self {
        Self {
            admins,
            tokens,
            policy: PasswordPolicy::from_config(config),
            // Out-of-range values saturate; login then fails closed on the overflowing expiry.
            remember_for: Duration::try_days(config.remember_me_days).unwrap_or(Duration::MAX),
            session_for: Duration::try_minutes(config.session_minutes).unwrap_or(Duration::MAX),
        }
    }

    pub fn validate_password(&self, password: &str) -> Result<(), PasswordPolicyError> {
        self.policy.validate(password)
    }

    /// attempt_login
    ///
    /// Verifies the credentials and, on success, establishes either a persistent or a
    /// session login through the cookie store. Fails closed: an unknown username, a wrong
    /// password or any storage/crypto error yields `false` and writes no cookie.
    pub async fn attempt_login(
        &self,
        cookies: &mut CookieStore,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> bool {
        // 1. Credential lookup (exact username)
        let record = match self.admins.find_by_username(username).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::info!("login rejected: unknown username");
                return false;
            }
            Err(e) => {
                tracing::error!(error = %e, "login failed: credential lookup error");
                return false;
            }
        };

        // 2. Password verification
        if !self.admins.verify_password(&record, password) {
            tracing::info!(admin_id = record.id, "login rejected: password mismatch");
            return false;
        }

        let now = Utc::now();
        let lifetime = if remember_me {
            self.remember_for
        } else {
            self.session_for
        };
        let Some(expires_at) = now.checked_add_signed(lifetime) else {
            tracing::error!(admin_id = record.id, remember_me, "login failed: credential expiry overflows");
            return false;
        };

        // 3. Remember-me: server-side token + persistent cookie
        if remember_me {
            let token = PersistentToken {
                admin_id: record.id,
                token: generate_token(),
                expires_at,
            };

            if let Err(e) = self.tokens.create(&token).await {
                tracing::error!(admin_id = record.id, error = %e, "login failed: could not persist token");
                return false;
            }

            cookies.set_persistent_token(&token.token, token.expires_at);
            tracing::info!(admin_id = record.id, mode = "persistent", "admin logged in");
            return true;
        }

        // 4. Session only: encrypted cookie, nothing stored
        let payload = SessionPayload {
            admin_id: record.id,
            exp: expires_at.timestamp(),
        };

        match cookies.set_encrypted_session(&payload, expires_at) {
            Ok(()) => {
                tracing::info!(admin_id = record.id, mode = "session", "admin logged in");
                true
            }
            Err(e) => {
                tracing::error!(admin_id = record.id, error = %e, "login failed: could not seal session");
                false
            }
        }
    }

    /// current_state
    ///
    /// Resolves the request's credentials against current store state. The token lookup is
    /// a single read that also checks expiry.
    pub async fn current_state(&self, cookies: &CookieStore) -> Result<AuthState, TokenStoreError> {
        if let Some(token) = cookies.get(TOKEN_COOKIE) {
            if let Some(record) = self.tokens.find_valid(token, Utc::now()).await? {
                return Ok(AuthState::Persistent {
                    admin_id: record.admin_id,
                });
            }
        }

        match cookies.get_decrypted_session() {
            Ok(Some(payload)) if payload.is_valid_at(Utc::now()) => Ok(AuthState::Session {
                admin_id: payload.admin_id,
            }),
            Ok(_) => Ok(AuthState::Unauthenticated),
            Err(e) => {
                tracing::warn!(error = %e, "admin_session cookie failed verification");
                Ok(AuthState::InvalidSession)
            }
        }
    }

    /// logout
    ///
    /// Clears both cookies regardless of which mode was active, then deletes the
    /// remember-me record if a token cookie was present. The cookies are cleared even when
    /// the delete fails; the store error is still returned.
    pub async fn logout(&self, cookies: &mut CookieStore) -> Result<(), TokenStoreError> {
        let token = cookies.get(TOKEN_COOKIE).map(str::to_owned);

        cookies.clear_cookie(TOKEN_COOKIE);
        cookies.clear_cookie(SESSION_COOKIE);

        if let Some(token) = token {
            let removed = self.tokens.delete(&token).await?;
            tracing::info!(removed, "remember-me token revoked");
        }
        Ok(())
    }
}
