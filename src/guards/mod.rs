//! Guards run before a route's handler and can stop the request.
//!
//! Routes name guards by string key; keys are resolved through the [`GuardRegistry`] at
//! dispatch time, so a route referencing an unregistered key fails with a configuration
//! error instead of being served unguarded.

pub mod admin_auth;
pub mod already_authenticated;
pub mod password_policy;

use async_trait::async_trait;
use axum::response::Response;
use std::{collections::HashMap, sync::Arc};

use crate::{auth::AuthenticationService, error::AppError, request::AdminRequest, routing::RouteTable};

pub use admin_auth::AdminAuthGate;
pub use already_authenticated::AlreadyAuthenticatedGate;
pub use password_policy::PasswordPolicyGate;

/// Registry key for [`AdminAuthGate`].
pub const ADMIN_AUTH: &str = "admin.auth";
/// Registry key for [`AlreadyAuthenticatedGate`].
pub const GUEST: &str = "guest";
/// Registry key for [`PasswordPolicyGate`].
pub const PASSWORD_POLICY: &str = "password.policy";

/// What a guard decided about the request.
#[derive(Debug)]
pub enum GuardOutcome {
    /// Continue with the next guard, or the handler if this was the last one.
    Allow,
    /// Stop and answer with `302 Found` to the given location.
    Redirect(String),
    /// Stop and answer with this response as-is.
    Reject(Response),
}

/// Guard
///
/// A single pre-handler check. Guards receive the request mutably so they can record
/// the authenticated admin or clear cookies that no longer prove anything.
#[async_trait]
pub trait Guard: Send + Sync {
    async fn handle(&self, request: &mut AdminRequest) -> Result<GuardOutcome, AppError>;
}

pub type GuardState = Arc<dyn Guard>;

/// GuardRegistry
///
/// Maps guard keys to guard instances.
#[derive(Default, Clone)]
pub struct GuardRegistry {
    guards: HashMap<String, GuardState>,
}

impl GuardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `guard` under `key`, replacing any previous guard with that key.
    pub fn register(&mut self, key: impl Into<String>, guard: GuardState) -> &mut Self {
        self.guards.insert(key.into(), guard);
        self
    }

    pub fn resolve(&self, key: &str) -> Result<GuardState, AppError> {
        self.guards
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::configuration(format!("guard `{key}` is not registered")))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.guards.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.guards.keys().map(String::as_str)
    }

    /// ensure_registered
    ///
    /// Checks every guard key referenced by `routes` at startup, so a typo in a route
    /// definition stops the server from booting rather than surfacing per request.
    pub fn ensure_registered(&self, routes: &RouteTable) -> Result<(), AppError> {
        let mut missing: Vec<&str> = routes.guard_ids().filter(|id| !self.contains(id)).collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort_unstable();
        missing.dedup();
        Err(AppError::configuration(format!(
            "routes reference unregistered guards: {}",
            missing.join(", ")
        )))
    }

    /// default_registry
    ///
    /// The three built-in guards under their standard keys.
    pub fn default_registry(auth: Arc<AuthenticationService>) -> Self {
        let mut registry = Self::new();
        registry
            .register(ADMIN_AUTH, Arc::new(AdminAuthGate::new(auth.clone())))
            .register(GUEST, Arc::new(AlreadyAuthenticatedGate::new(auth.clone())))
            .register(PASSWORD_POLICY, Arc::new(PasswordPolicyGate::new(auth)));
        registry
    }
}

impl std::fmt::Debug for GuardRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("GuardRegistry").field("keys", &keys).finish()
    }
}
