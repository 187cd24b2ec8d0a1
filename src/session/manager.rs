//! Session Manager - current identity and bearer token
//!
//! The `SessionManager` is the single owner of the current user and token. In
//! a host runtime it signs in through the bridge's auth exchange; without one,
//! or when the exchange fails, it falls back to a local identity that has no
//! token. Authentication failures never propagate: they only leave payment
//! unavailable.
//!
//! ## Lifecycle
//!
//! `Uninitialized → Loading → {Authenticated(Host), Authenticated(Local), Anonymous}`

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::bridge::{BridgeError, MiniAppBridge};
use crate::errors::InsuranceError;
use crate::models::User;
use crate::session::state::{AuthMode, Session, SessionState};
use crate::storage::{PersistenceMirror, StorageError};
use crate::utils::logging::LoggingHelper;

pub struct SessionManager {
    bridge: Arc<MiniAppBridge>,
    mirror: PersistenceMirror,
    session: Session,
}

// =============================================================================
// Construction and accessors
// =============================================================================

impl SessionManager {
    #[must_use]
    pub fn new(bridge: Arc<MiniAppBridge>, mirror: PersistenceMirror) -> Self {
        let session = Session {
            is_host_runtime: bridge.detect_host_runtime(),
            ..Session::default()
        };
        Self {
            bridge,
            mirror,
            session,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.session.user()
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.session.token()
    }

    /// Drop in-memory identity without touching persisted state
    pub fn reset(&mut self) {
        self.session = Session {
            is_host_runtime: self.session.is_host_runtime,
            ..Session::default()
        };
    }
}

// =============================================================================
// Authentication
// =============================================================================

impl SessionManager {
    /// Establish the startup session
    ///
    /// Host runtimes attempt the auth exchange; on failure, and outside a
    /// host, any persisted user is restored without a token.
    pub async fn initialize(&mut self) {
        self.session.state = SessionState::Loading;

        if self.session.is_host_runtime {
            match self.sign_in_with_host("").await {
                Ok(_) => self
                    .bridge
                    .show_notification(&self.bridge.messages().login_success),
                Err(e) => {
                    LoggingHelper::log_auth_fallback(&e);
                    self.restore_persisted_user();
                }
            }
        } else {
            self.restore_persisted_user();
        }
    }

    /// Sign in a user
    ///
    /// In a host runtime this runs the host exchange; `email` only serves as
    /// the contact fallback and `password` is ignored. Otherwise, or if the
    /// exchange fails, a local user is synthesized from `email` without any
    /// credential check.
    pub async fn login(&mut self, email: &str, _password: &str) -> User {
        if self.session.is_host_runtime {
            self.session.state = SessionState::Loading;
            match self.sign_in_with_host(email).await {
                Ok(user) => {
                    self.bridge
                        .show_notification(&self.bridge.messages().login_success);
                    return user;
                }
                Err(e) => LoggingHelper::log_auth_fallback(&e),
            }
        }

        let user = User::local(email, User::name_from_email(email));
        self.establish_local(user.clone());
        user
    }

    /// Register a user; in a host runtime this is the same as `login`
    ///
    /// No credential validation and no duplicate-account detection.
    pub async fn register(&mut self, email: &str, password: &str, name: &str) -> User {
        if self.session.is_host_runtime {
            return self.login(email, password).await;
        }

        let user = User::local(email, name);
        self.establish_local(user.clone());
        user
    }

    /// Re-run the host exchange, typically because a payment needs a token
    ///
    /// Returns `false` outside a host runtime or when the exchange fails; the
    /// previous session is then left untouched.
    pub async fn reauthenticate(&mut self) -> bool {
        if !self.session.is_host_runtime {
            return false;
        }

        let previous = self.session.state;
        self.session.state = SessionState::Loading;
        match self.sign_in_with_host("").await {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Re-authentication failed: {e}");
                self.session.state = previous;
                false
            }
        }
    }

    /// Clear user and token, and wipe the persisted user, token and documents
    ///
    /// # Errors
    ///
    /// Returns the first persistence failure; the in-memory session is
    /// cleared regardless.
    pub fn logout(&mut self) -> Result<(), StorageError> {
        if let Some(user) = self.session.user.take() {
            log::info!("Signing out user {}", user.id);
        }
        self.session.token = None;
        self.session.state = SessionState::Anonymous;

        let cleared = self.mirror.clear_session();
        if self.session.is_host_runtime {
            self.bridge.show_notification(&self.bridge.messages().logout);
        }
        cleared
    }

    /// Shallow-merge `fields` into the current user and persist the result
    ///
    /// The user `id` is never overwritten.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` without a current user
    /// - `InvalidRequest` if a typed field gets a value of the wrong type
    /// - `Persistence` if the updated user cannot be written; memory is updated anyway
    pub fn update_profile(&mut self, fields: Map<String, Value>) -> Result<&User, InsuranceError> {
        let current = self
            .session
            .user
            .as_ref()
            .ok_or(InsuranceError::Unauthenticated)?;

        let mut merged = serde_json::to_value(current)
            .map_err(|e| InsuranceError::InvalidRequest(format!("profile encoding: {e}")))?;
        if let Value::Object(existing) = &mut merged {
            for (key, value) in fields {
                if key == "id" {
                    log::warn!("Ignoring attempt to change the user id");
                    continue;
                }
                existing.insert(key, value);
            }
        }

        let updated: User = serde_json::from_value(merged)
            .map_err(|e| InsuranceError::InvalidRequest(format!("profile update: {e}")))?;

        let user = self.session.user.insert(updated);
        self.mirror.save_user(user)?;
        Ok(user)
    }
}

// =============================================================================
// Internals
// =============================================================================

impl SessionManager {
    async fn sign_in_with_host(&mut self, contact_fallback: &str) -> Result<User, BridgeError> {
        let auth = self.bridge.authenticate().await?;
        let user = User::from_host_profile(
            &auth.profile,
            &auth.auth_code,
            contact_fallback,
            &self.bridge.messages().default_user_name,
        );

        let persisted = match auth.token.as_deref() {
            Some(token) => self.mirror.save_token(token),
            None => self.mirror.clear_token(),
        };
        if let Err(e) = persisted {
            log::warn!("Failed to persist session token: {e}");
        }
        self.session.token = auth.token;

        self.persist_user(&user);
        self.session.user = Some(user.clone());
        self.session.settle(AuthMode::Host);
        LoggingHelper::log_session_established(&user.id, "host");
        Ok(user)
    }

    fn establish_local(&mut self, user: User) {
        self.persist_user(&user);
        LoggingHelper::log_session_established(&user.id, "local");
        self.session.user = Some(user);
        self.session.token = None;
        self.session.settle(AuthMode::Local);
    }

    fn restore_persisted_user(&mut self) {
        self.session.user = self.mirror.load_user();
        self.session.token = None;
        self.session.settle(AuthMode::Local);
        if let Some(user) = &self.session.user {
            log::info!("Restored persisted user {} without token", user.id);
        }
    }

    fn persist_user(&self, user: &User) {
        if let Err(e) = self.mirror.save_user(user) {
            log::warn!("Failed to persist user {}: {e}", user.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::HostAdapter;
    use crate::settings::TravelSettings;
    use crate::storage::{KeyValueStore, MemoryStore, DOCUMENTS_KEY, TOKEN_KEY, USER_KEY};
    use crate::testing::mock::{MockHostRuntime, RecordingNotifier};
    use serde_json::json;

    fn local_manager() -> (SessionManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let bridge = MiniAppBridge::new(HostAdapter::Fallback, &TravelSettings::default())
            .with_notifier(Arc::new(RecordingNotifier::default()));
        let manager = SessionManager::new(Arc::new(bridge), PersistenceMirror::new(store.clone()));
        (manager, store)
    }

    #[tokio::test]
    async fn test_initialize_without_host_and_without_user_is_anonymous() {
        let (mut manager, _) = local_manager();
        manager.initialize().await;
        assert_eq!(manager.session().state(), SessionState::Anonymous);
        assert!(manager.current_user().is_none());
    }

    #[tokio::test]
    async fn test_initialize_restores_persisted_user_without_token() {
        let (mut manager, store) = local_manager();
        let user = User::local("hiba@example.com", "hiba");
        store
            .set(USER_KEY, &serde_json::to_string(&user).unwrap())
            .unwrap();
        store.set(TOKEN_KEY, "stale-token").unwrap();

        manager.initialize().await;

        assert_eq!(manager.current_user(), Some(&user));
        assert!(manager.token().is_none());
        assert_eq!(
            manager.session().state(),
            SessionState::Authenticated(AuthMode::Local)
        );
    }

    #[tokio::test]
    async fn test_local_login_synthesizes_user_from_email() {
        let (mut manager, store) = local_manager();
        let user = manager.login("zainab@example.com", "anything").await;

        assert_eq!(user.email, "zainab@example.com");
        assert_eq!(user.name, "zainab");
        assert!(store.get(USER_KEY).unwrap().is_some());
        assert!(manager.token().is_none());
    }

    #[tokio::test]
    async fn test_local_register_keeps_given_name() {
        let (mut manager, _) = local_manager();
        let user = manager.register("k@example.com", "pw", "Karim").await;
        assert_eq!(user.name, "Karim");
        assert_eq!(manager.current_user().map(|u| u.name.as_str()), Some("Karim"));
    }

    #[tokio::test]
    async fn test_reauthenticate_outside_host_is_false() {
        let (mut manager, _) = local_manager();
        assert!(!manager.reauthenticate().await);
    }

    #[tokio::test]
    async fn test_logout_wipes_everything() {
        let (mut manager, store) = local_manager();
        manager.login("a@example.com", "pw").await;
        store.set(DOCUMENTS_KEY, "[]").unwrap();
        store.set(TOKEN_KEY, "t").unwrap();

        manager.logout().unwrap();

        assert!(manager.current_user().is_none());
        assert!(manager.token().is_none());
        assert_eq!(manager.session().state(), SessionState::Anonymous);
        for key in [USER_KEY, TOKEN_KEY, DOCUMENTS_KEY] {
            assert!(store.get(key).unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_update_profile_merges_and_persists() {
        let (mut manager, store) = local_manager();
        let original = manager.login("m@example.com", "pw").await;

        let mut fields = Map::new();
        fields.insert("name".to_string(), json!("Maryam"));
        fields.insert("phone".to_string(), json!("+9647800000000"));
        fields.insert("id".to_string(), json!("hijack"));

        let updated = manager.update_profile(fields).unwrap().clone();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.name, "Maryam");
        assert_eq!(updated.profile.get("phone"), Some(&json!("+9647800000000")));

        let stored: User = serde_json::from_str(&store.get(USER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_update_profile_rejects_wrong_types() {
        let (mut manager, _) = local_manager();
        manager.login("m@example.com", "pw").await;

        let mut fields = Map::new();
        fields.insert("name".to_string(), json!(42));
        assert!(matches!(
            manager.update_profile(fields),
            Err(InsuranceError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_update_profile_requires_user() {
        let (mut manager, _) = local_manager();
        assert!(matches!(
            manager.update_profile(Map::new()),
            Err(InsuranceError::Unauthenticated)
        ));
    }

    fn host_manager(base_url: &str, store: Arc<MemoryStore>) -> SessionManager {
        let mut settings = TravelSettings::default();
        settings.api.base_url = base_url.to_string();
        let host: Arc<dyn crate::bridge::HostRuntime> = Arc::new(MockHostRuntime::new());
        let bridge = MiniAppBridge::new(HostAdapter::detect(Some(host)), &settings)
            .with_notifier(Arc::new(RecordingNotifier::default()));
        SessionManager::new(Arc::new(bridge), PersistenceMirror::new(store))
    }

    #[tokio::test]
    async fn test_exchange_without_token_drops_stale_persisted_token() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth-with-superQi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "u-3" })))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        store.set(TOKEN_KEY, "stale-token").unwrap();
        let mut manager = host_manager(&server.uri(), store.clone());

        manager.initialize().await;

        assert_eq!(manager.current_user().map(|u| u.id.as_str()), Some("u-3"));
        assert!(manager.token().is_none());
        assert!(store.get(TOKEN_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reauthenticate_recovers_after_failed_exchange() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth-with-superQi"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth-with-superQi"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "token": "fresh", "id": "u-4" })),
            )
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let mut manager = host_manager(&server.uri(), store.clone());

        manager.initialize().await;
        assert!(manager.token().is_none());
        assert_eq!(manager.session().state(), SessionState::Anonymous);

        assert!(manager.reauthenticate().await);
        assert_eq!(manager.token(), Some("fresh"));
        assert_eq!(
            manager.session().state(),
            SessionState::Authenticated(AuthMode::Host)
        );
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_host_failure_degrades_to_persisted_user() {
        let store = Arc::new(MemoryStore::new());
        let user = User::local("saved@example.com", "saved");
        store
            .set(USER_KEY, &serde_json::to_string(&user).unwrap())
            .unwrap();

        let host: Arc<dyn crate::bridge::HostRuntime> =
            Arc::new(MockHostRuntime::new().failing_auth("no consent"));
        let bridge = MiniAppBridge::new(HostAdapter::detect(Some(host)), &TravelSettings::default())
            .with_notifier(Arc::new(RecordingNotifier::default()));
        let mut manager = SessionManager::new(Arc::new(bridge), PersistenceMirror::new(store));

        manager.initialize().await;

        assert!(manager.session().is_host_runtime());
        assert_eq!(manager.current_user(), Some(&user));
        assert!(manager.token().is_none());
        assert!(!manager.session().can_pay());
        assert!(!manager.reauthenticate().await);
        assert_eq!(
            manager.session().state(),
            SessionState::Authenticated(AuthMode::Local)
        );
    }
}
