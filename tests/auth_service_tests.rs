use admin_gate::{
    AppConfig,
    auth::{
        AuthState, AuthenticationService, PasswordPolicy, PasswordRule, validate_password,
    },
    cipher::Cipher,
    config::LOCAL_APP_KEY,
    cookies::{CookieStore, SESSION_COOKIE, TOKEN_COOKIE},
    models::{AdminCredential, PersistentToken, SessionPayload},
    repository::{AdminRepository, RepositoryError},
    tokens::{InMemoryTokenStore, TokenStore, TokenStoreError, generate_token},
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;

// --- Mock Repository for Credential Lookups ---

struct MockAdminRepo {
    admin: AdminCredential,
}

impl MockAdminRepo {
    fn new(username: &str, password: &str) -> Self {
        Self {
            admin: AdminCredential {
                id: 1,
                username: username.to_string(),
                password_hash: bcrypt::hash(password, 4).unwrap(),
            },
        }
    }
}

#[async_trait]
impl AdminRepository for MockAdminRepo {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminCredential>, RepositoryError> {
        Ok((self.admin.username == username).then(|| self.admin.clone()))
    }
}

struct FailingRepo;

#[async_trait]
impl AdminRepository for FailingRepo {
    async fn find_by_username(
        &self,
        _username: &str,
    ) -> Result<Option<AdminCredential>, RepositoryError> {
        Err(RepositoryError(sqlx::Error::PoolTimedOut))
    }
}

fn service_with(
    admins: Arc<dyn AdminRepository>,
) -> (AuthenticationService, Arc<InMemoryTokenStore>) {
    let tokens = Arc::new(InMemoryTokenStore::new());
    let service = AuthenticationService::new(admins, tokens.clone(), &AppConfig::default());
    (service, tokens)
}

fn service() -> (AuthenticationService, Arc<InMemoryTokenStore>) {
    service_with(Arc::new(MockAdminRepo::new("admin", "Abc12345")))
}

fn cookies() -> CookieStore {
    CookieStore::new(Arc::new(Cipher::from_base64_key(LOCAL_APP_KEY).unwrap()), false)
}

// --- Login ---

#[tokio::test]
async fn test_remember_me_login_persists_token_for_30_days() {
    let (service, tokens) = service();
    let mut cookies = cookies();

    let before = Utc::now();
    assert!(service.attempt_login(&mut cookies, "admin", "Abc12345", true).await);

    let token = cookies.get(TOKEN_COOKIE).expect("admin_token cookie").to_string();
    let record = tokens.get(&token).expect("token record");

    assert_eq!(record.admin_id, 1);
    assert_eq!(token.len(), 64);
    let expected = before + Duration::days(30);
    assert!((record.expires_at - expected).num_seconds().abs() <= 5);

    // No session cookie for a remember-me login.
    assert_eq!(cookies.get(SESSION_COOKIE), None);
    assert_eq!(
        service.current_state(&cookies).await.unwrap(),
        AuthState::Persistent { admin_id: 1 }
    );
}

#[tokio::test]
async fn test_session_login_stores_nothing_server_side() {
    let (service, tokens) = service();
    let mut cookies = cookies();

    let before = Utc::now();
    assert!(service.attempt_login(&mut cookies, "admin", "Abc12345", false).await);

    assert!(tokens.is_empty());
    assert_eq!(cookies.get(TOKEN_COOKIE), None);

    let payload = cookies.get_decrypted_session().unwrap().expect("session payload");
    assert_eq!(payload.admin_id, 1);
    let expected = (before + Duration::minutes(30)).timestamp();
    assert!((payload.exp - expected).abs() <= 5);

    assert_eq!(
        service.current_state(&cookies).await.unwrap(),
        AuthState::Session { admin_id: 1 }
    );
}

#[tokio::test]
async fn test_wrong_password_writes_no_cookie() {
    let (service, tokens) = service();
    let mut cookies = cookies();

    assert!(!service.attempt_login(&mut cookies, "admin", "Wrong1234", true).await);
    assert!(!service.attempt_login(&mut cookies, "nobody", "Abc12345", false).await);
    // Usernames match exactly.
    assert!(!service.attempt_login(&mut cookies, "Admin", "Abc12345", false).await);

    assert!(tokens.is_empty());
    assert!(cookies.set_cookie_headers().is_empty());
}

#[tokio::test]
async fn test_login_fails_closed_on_repository_error() {
    let (service, _) = service_with(Arc::new(FailingRepo));
    let mut cookies = cookies();

    assert!(!service.attempt_login(&mut cookies, "admin", "Abc12345", false).await);
    assert!(cookies.set_cookie_headers().is_empty());
}

#[tokio::test]
async fn test_login_fails_closed_on_unrepresentable_expiry() {
    let tokens = Arc::new(InMemoryTokenStore::new());
    let config = AppConfig {
        remember_me_days: 200_000_000,
        session_minutes: i64::MAX,
        ..AppConfig::default()
    };
    let service = AuthenticationService::new(
        Arc::new(MockAdminRepo::new("admin", "Abc12345")),
        tokens.clone(),
        &config,
    );
    let mut cookies = cookies();

    assert!(!service.attempt_login(&mut cookies, "admin", "Abc12345", true).await);
    assert!(!service.attempt_login(&mut cookies, "admin", "Abc12345", false).await);

    assert!(tokens.is_empty());
    assert!(cookies.set_cookie_headers().is_empty());
}

// --- Current State ---

#[tokio::test]
async fn test_no_cookies_is_unauthenticated() {
    let (service, _) = service();
    assert_eq!(
        service.current_state(&cookies()).await.unwrap(),
        AuthState::Unauthenticated
    );
}

#[tokio::test]
async fn test_expired_session_is_unauthenticated() {
    let (service, _) = service();
    let mut cookies = cookies();
    let payload = SessionPayload {
        admin_id: 1,
        exp: (Utc::now() - Duration::minutes(1)).timestamp(),
    };
    cookies
        .set_encrypted_session(&payload, Utc::now() + Duration::minutes(30))
        .unwrap();

    assert_eq!(
        service.current_state(&cookies).await.unwrap(),
        AuthState::Unauthenticated
    );
}

#[tokio::test]
async fn test_expired_token_falls_back_to_session() {
    let (service, tokens) = service();
    let mut cookies = cookies();

    let stale = PersistentToken {
        admin_id: 1,
        token: generate_token(),
        expires_at: Utc::now() - Duration::seconds(1),
    };
    tokens.create(&stale).await.unwrap();
    cookies.set_persistent_token(&stale.token, Utc::now() + Duration::days(1));

    assert_eq!(
        service.current_state(&cookies).await.unwrap(),
        AuthState::Unauthenticated
    );

    let payload = SessionPayload {
        admin_id: 2,
        exp: (Utc::now() + Duration::minutes(5)).timestamp(),
    };
    cookies
        .set_encrypted_session(&payload, Utc::now() + Duration::minutes(5))
        .unwrap();

    assert_eq!(
        service.current_state(&cookies).await.unwrap(),
        AuthState::Session { admin_id: 2 }
    );
}

// --- Logout ---

#[tokio::test]
async fn test_logout_revokes_token_and_clears_both_cookies() {
    let (service, tokens) = service();
    let mut cookies = cookies();
    assert!(service.attempt_login(&mut cookies, "admin", "Abc12345", true).await);
    let token = cookies.get(TOKEN_COOKIE).unwrap().to_string();

    service.logout(&mut cookies).await.unwrap();

    assert!(tokens.find_valid(&token, Utc::now()).await.unwrap().is_none());
    assert_eq!(cookies.get(TOKEN_COOKIE), None);
    assert_eq!(cookies.get(SESSION_COOKIE), None);

    let cleared: Vec<String> = cookies
        .changes()
        .filter(|c| c.value().is_empty())
        .map(|c| c.name().to_string())
        .collect();
    assert!(cleared.contains(&"admin_token".to_string()));
    assert!(cleared.contains(&"admin_session".to_string()));

    assert_eq!(
        service.current_state(&cookies).await.unwrap(),
        AuthState::Unauthenticated
    );
}

#[tokio::test]
async fn test_logout_without_credentials_is_harmless() {
    let (service, _) = service();
    let mut cookies = cookies();

    service.logout(&mut cookies).await.unwrap();
    assert_eq!(cookies.set_cookie_headers().len(), 2);
}

/// Token store whose database is gone: every call fails.
struct UnreachableTokenStore;

#[async_trait]
impl TokenStore for UnreachableTokenStore {
    async fn create(&self, _token: &PersistentToken) -> Result<(), TokenStoreError> {
        Err(TokenStoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn find_valid(
        &self,
        _token: &str,
        _now: chrono::DateTime<Utc>,
    ) -> Result<Option<PersistentToken>, TokenStoreError> {
        Err(TokenStoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn delete(&self, _token: &str) -> Result<bool, TokenStoreError> {
        Err(TokenStoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn purge_expired(&self, _now: chrono::DateTime<Utc>) -> Result<u64, TokenStoreError> {
        Err(TokenStoreError::Database(sqlx::Error::PoolTimedOut))
    }
}

#[tokio::test]
async fn test_logout_clears_cookies_even_when_revocation_fails() {
    let service = AuthenticationService::new(
        Arc::new(MockAdminRepo::new("admin", "Abc12345")),
        Arc::new(UnreachableTokenStore),
        &AppConfig::default(),
    );
    let mut cookies = cookies();
    cookies.set_persistent_token(&generate_token(), Utc::now() + Duration::days(1));
    cookies
        .set_encrypted_session(
            &SessionPayload {
                admin_id: 1,
                exp: (Utc::now() + Duration::minutes(5)).timestamp(),
            },
            Utc::now() + Duration::minutes(5),
        )
        .unwrap();

    let result = service.logout(&mut cookies).await;

    assert!(matches!(result, Err(TokenStoreError::Database(_))));
    assert_eq!(cookies.get(TOKEN_COOKIE), None);
    assert_eq!(cookies.get(SESSION_COOKIE), None);

    let cleared: Vec<String> = cookies
        .changes()
        .filter(|c| c.value().is_empty())
        .map(|c| c.name().to_string())
        .collect();
    assert_eq!(cleared.len(), 2);
    assert!(cleared.contains(&"admin_token".to_string()));
    assert!(cleared.contains(&"admin_session".to_string()));
}

// --- Token Store ---

#[tokio::test]
async fn test_token_store_rejects_duplicates() {
    let tokens = InMemoryTokenStore::new();
    let record = PersistentToken {
        admin_id: 1,
        token: "fixed".to_string(),
        expires_at: Utc::now() + Duration::days(1),
    };

    tokens.create(&record).await.unwrap();
    assert!(matches!(
        tokens.create(&record).await,
        Err(TokenStoreError::Collision)
    ));
    assert_eq!(tokens.len(), 1);
}

#[tokio::test]
async fn test_token_store_purges_only_expired() {
    let tokens = InMemoryTokenStore::new();
    let now = Utc::now();
    for (name, offset) in [("old", -10), ("older", -100), ("fresh", 100)] {
        tokens
            .create(&PersistentToken {
                admin_id: 1,
                token: name.to_string(),
                expires_at: now + Duration::seconds(offset),
            })
            .await
            .unwrap();
    }

    assert_eq!(tokens.purge_expired(now).await.unwrap(), 2);
    assert!(tokens.get("fresh").is_some());
    assert!(!tokens.delete("old").await.unwrap());
    assert!(tokens.delete("fresh").await.unwrap());
}

#[test]
fn test_generated_tokens_are_unique_hex() {
    let a = generate_token();
    let b = generate_token();

    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
}

// --- Password Policy ---

#[test]
fn test_password_policy_accepts_strong_password() {
    assert!(validate_password("Abc12345").is_ok());
}

#[test]
fn test_password_policy_rejections() {
    let short = validate_password("abc").unwrap_err();
    assert!(short.violations.contains(&PasswordRule::MinLength(8)));

    let no_upper = validate_password("abcdefg1").unwrap_err();
    assert_eq!(no_upper.violations, vec![PasswordRule::Uppercase]);

    let no_digit = validate_password("Abcdefgh").unwrap_err();
    assert_eq!(no_digit.violations, vec![PasswordRule::Digit]);

    let empty = validate_password("").unwrap_err();
    assert_eq!(empty.violations, vec![PasswordRule::Required]);
    assert_eq!(empty.message, "Password is required.");
}

#[test]
fn test_password_policy_symbol_rule_is_opt_in() {
    let strict = PasswordPolicy {
        require_symbol: true,
        ..PasswordPolicy::default()
    };

    assert_eq!(
        strict.validate("Abc12345").unwrap_err().violations,
        vec![PasswordRule::Symbol]
    );
    assert!(strict.validate("Abc1234!").is_ok());
}
