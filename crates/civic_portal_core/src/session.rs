//! crates/civic_portal_core/src/session.rs
//!
//! Client-side session store. The token and the minimal profile projection
//! live in session storage; the ephemeral scope always holds a copy, the
//! durable scope only when the user asked to be remembered.
//!
//! State is read straight from storage on every query, so a teardown done by
//! the HTTP client on a 401 is visible here immediately.

use tracing::{info, warn};

use crate::client::ApiClient;
use crate::domain::{AuthToken, Credentials, Registration, Role, SessionProfile};
use crate::ports::{PortError, PortResult, SessionStorage, StorageScope};

pub const TOKEN_KEY: &str = "access_token";
pub const PROFILE_KEY: &str = "user";

pub const LOGOUT_PROMPT: &str = "Are you sure you want to logout?";

//=========================================================================================
// Storage Helpers
//=========================================================================================

/// Ephemeral scope first, durable as fallback.
pub fn stored_token(storage: &dyn SessionStorage) -> Option<String> {
    storage
        .get(StorageScope::Ephemeral, TOKEN_KEY)
        .or_else(|| storage.get(StorageScope::Durable, TOKEN_KEY))
        .filter(|token| !token.is_empty())
}

pub fn stored_profile(storage: &dyn SessionStorage) -> Option<SessionProfile> {
    let raw = storage
        .get(StorageScope::Ephemeral, PROFILE_KEY)
        .or_else(|| storage.get(StorageScope::Durable, PROFILE_KEY))?;
    match serde_json::from_str(&raw) {
        Ok(profile) => Some(profile),
        Err(e) => {
            warn!("Ignoring unreadable cached profile: {}", e);
            None
        }
    }
}

/// Removes the session from both scopes unconditionally.
pub fn clear_stored_session(storage: &dyn SessionStorage) {
    for scope in [StorageScope::Durable, StorageScope::Ephemeral] {
        storage.remove(scope, TOKEN_KEY);
        storage.remove(scope, PROFILE_KEY);
    }
}

fn write_session(
    storage: &dyn SessionStorage,
    scope: StorageScope,
    token: &str,
    profile: &SessionProfile,
) -> PortResult<()> {
    let encoded = serde_json::to_string(profile)
        .map_err(|e| PortError::Unexpected(format!("Failed to encode profile: {}", e)))?;
    storage.set(scope, TOKEN_KEY, token)?;
    storage.set(scope, PROFILE_KEY, &encoded)
}

//=========================================================================================
// The Store
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated(SessionProfile),
}

/// Outcome of a role-gated entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// Not signed in at all; send to the login screen.
    LoginRequired,
    /// Signed in with the wrong role.
    Denied,
}

pub struct AuthStore {
    client: ApiClient,
}

impl AuthStore {
    /// Opens the store over the client's storage. A session that only exists
    /// in the durable scope is copied into the ephemeral one.
    pub fn restore(client: ApiClient) -> Self {
        let storage = client.storage().clone();
        let ephemeral_token = storage.get(StorageScope::Ephemeral, TOKEN_KEY);
        if ephemeral_token.is_none() {
            if let Some(token) = storage.get(StorageScope::Durable, TOKEN_KEY) {
                let copied = storage
                    .set(StorageScope::Ephemeral, TOKEN_KEY, &token)
                    .and_then(|_| match storage.get(StorageScope::Durable, PROFILE_KEY) {
                        Some(profile) => {
                            storage.set(StorageScope::Ephemeral, PROFILE_KEY, &profile)
                        }
                        None => Ok(()),
                    });
                if let Err(e) = copied {
                    warn!("Failed to copy remembered session into the ephemeral scope: {}", e);
                }
            }
        }
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn state(&self) -> AuthState {
        match self.profile() {
            Some(profile) => AuthState::Authenticated(profile),
            None => AuthState::Anonymous,
        }
    }

    /// A token without a readable profile counts as signed out.
    pub fn is_authenticated(&self) -> bool {
        self.profile().is_some()
    }

    pub fn profile(&self) -> Option<SessionProfile> {
        let storage = self.client.storage().as_ref();
        stored_token(storage)?;
        stored_profile(storage)
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.profile().is_some_and(|profile| &profile.role == role)
    }

    pub fn require_role(&self, role: &Role) -> Access {
        if !self.is_authenticated() {
            return Access::LoginRequired;
        }
        if self.has_role(role) {
            Access::Granted
        } else {
            warn!(required = %role, "Access denied for current role");
            Access::Denied
        }
    }

    pub async fn login(
        &mut self,
        credentials: &Credentials,
        remember: bool,
    ) -> PortResult<SessionProfile> {
        let token = self.client.auth().login(credentials).await?;
        self.establish(&token, remember)
    }

    pub async fn register(
        &mut self,
        registration: &Registration,
        remember: bool,
    ) -> PortResult<SessionProfile> {
        let token = self.client.auth().register(registration).await?;
        self.establish(&token, remember)
    }

    fn establish(&mut self, token: &AuthToken, remember: bool) -> PortResult<SessionProfile> {
        let storage = self.client.storage().clone();
        let profile = token.profile();

        write_session(storage.as_ref(), StorageScope::Ephemeral, &token.access_token, &profile)?;
        if remember {
            write_session(storage.as_ref(), StorageScope::Durable, &token.access_token, &profile)?;
        } else {
            storage.remove(StorageScope::Durable, TOKEN_KEY);
            storage.remove(StorageScope::Durable, PROFILE_KEY);
        }

        info!(user_id = profile.user_id, role = %profile.role, remember, "Signed in");
        Ok(profile)
    }

    /// Re-fetches the account from the server and overwrites the cached
    /// projection. A 401 leaves the store anonymous.
    pub async fn current_user(&mut self) -> PortResult<SessionProfile> {
        let cached_role = self.profile().map(|profile| profile.role);
        let account = self.client.auth().me().await?;

        let profile = SessionProfile {
            user_id: account.account_id,
            email: account.email,
            role: account.role.or(cached_role).unwrap_or(Role::Citizen),
        };

        let storage = self.client.storage().clone();
        let Some(token) = stored_token(storage.as_ref()) else {
            return Err(PortError::Unauthorized);
        };
        write_session(storage.as_ref(), StorageScope::Ephemeral, &token, &profile)?;
        if storage.get(StorageScope::Durable, TOKEN_KEY).is_some() {
            write_session(storage.as_ref(), StorageScope::Durable, &token, &profile)?;
        }
        Ok(profile)
    }

    /// Asks for confirmation, then tears the session down in both scopes.
    /// The server is told best-effort; its answer never blocks the logout.
    pub async fn logout(&mut self, confirm: impl FnOnce(&str) -> bool) -> bool {
        if !confirm(LOGOUT_PROMPT) {
            return false;
        }
        if self.is_authenticated() {
            if let Err(e) = self.client.auth().logout().await {
                warn!("Server-side logout failed, clearing local session anyway: {}", e);
            }
        }
        clear_stored_session(self.client.storage().as_ref());
        info!("Signed out");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStorage, ScriptedTransport};
    use std::sync::Arc;

    const TOKEN_BODY: &str =
        r#"{"access_token": "tok-9", "token_type": "bearer", "user_id": 9, "email": "amal@example.com", "role": "citizen"}"#;

    fn store() -> (AuthStore, Arc<ScriptedTransport>, Arc<MemoryStorage>) {
        let transport = Arc::new(ScriptedTransport::new());
        let storage = Arc::new(MemoryStorage::default());
        let client = ApiClient::new(transport.clone(), storage.clone());
        (AuthStore::restore(client), transport, storage)
    }

    fn credentials() -> Credentials {
        Credentials {
            email: "amal@example.com".to_string(),
            password: "SecurePass123".to_string(),
        }
    }

    #[tokio::test]
    async fn remembered_login_populates_both_scopes() {
        let (mut store, transport, storage) = store();
        transport.respond("/auth/login", 200, TOKEN_BODY);

        let profile = store.login(&credentials(), true).await.unwrap();

        assert_eq!(profile.user_id, 9);
        for scope in [StorageScope::Durable, StorageScope::Ephemeral] {
            assert_eq!(storage.get(scope, TOKEN_KEY).as_deref(), Some("tok-9"));
            assert!(storage.get(scope, PROFILE_KEY).is_some());
        }
        assert_eq!(store.state(), AuthState::Authenticated(profile));
    }

    #[tokio::test]
    async fn session_only_login_skips_durable_scope() {
        let (mut store, transport, storage) = store();
        transport.respond("/auth/login", 200, TOKEN_BODY);

        store.login(&credentials(), false).await.unwrap();

        assert_eq!(storage.get(StorageScope::Ephemeral, TOKEN_KEY).as_deref(), Some("tok-9"));
        assert!(storage.get(StorageScope::Durable, TOKEN_KEY).is_none());
        assert!(storage.get(StorageScope::Durable, PROFILE_KEY).is_none());
    }

    #[tokio::test]
    async fn login_is_form_encoded() {
        let (mut store, transport, _storage) = store();
        transport.respond("/auth/login", 200, TOKEN_BODY);

        store.login(&credentials(), false).await.unwrap();

        let sent = transport.sent();
        assert!(matches!(
            &sent[0].body,
            crate::ports::RequestBody::Form(fields)
                if fields.contains(&("email".to_string(), "amal@example.com".to_string()))
        ));
    }

    #[tokio::test]
    async fn logout_clears_both_scopes_even_when_server_fails() {
        let (mut store, transport, storage) = store();
        transport.respond("/auth/login", 200, TOKEN_BODY);
        store.login(&credentials(), true).await.unwrap();
        transport.respond("/auth/logout", 500, r#"{"detail": "boom"}"#);

        assert!(store.logout(|_| true).await);

        assert!(storage.is_empty());
        assert_eq!(store.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn declined_logout_keeps_session() {
        let (mut store, transport, _storage) = store();
        transport.respond("/auth/login", 200, TOKEN_BODY);
        store.login(&credentials(), false).await.unwrap();

        assert!(!store.logout(|prompt| {
            assert_eq!(prompt, LOGOUT_PROMPT);
            false
        })
        .await);
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn refresh_unauthorized_turns_anonymous() {
        let (mut store, transport, _storage) = store();
        transport.respond("/auth/login", 200, TOKEN_BODY);
        store.login(&credentials(), true).await.unwrap();
        transport.respond("/auth/me", 401, r#"{"detail": "Token expired"}"#);

        let err = store.current_user().await.unwrap_err();

        assert_eq!(err, PortError::Unauthorized);
        assert_eq!(store.state(), AuthState::Anonymous);
        assert!(store.profile().is_none());
    }

    #[tokio::test]
    async fn refresh_keeps_cached_role_when_server_omits_it() {
        let (mut store, transport, _storage) = store();
        transport.respond("/auth/login", 200, TOKEN_BODY);
        store.login(&credentials(), false).await.unwrap();
        transport.respond(
            "/auth/me",
            200,
            r#"{"account_id": 9, "email": "amal.new@example.com", "phone": null, "is_active": true}"#,
        );

        let profile = store.current_user().await.unwrap();

        assert_eq!(profile.email, "amal.new@example.com");
        assert_eq!(profile.role, Role::Citizen);
        assert_eq!(store.profile(), Some(profile));
    }

    fn registration() -> Registration {
        Registration {
            email: "amal@example.com".to_string(),
            password: "SecurePass123".to_string(),
            phone: Some("+961 70 123456".to_string()),
            national_id: "LB-0042".to_string(),
            first_name: "Amal".to_string(),
            middle_name: None,
            last_name: "Haddad".to_string(),
            date_of_birth: "1990-05-14".to_string(),
            father_name: None,
            mother_name: None,
            address: None,
            marital_status: None,
        }
    }

    #[tokio::test]
    async fn register_sends_json_and_remembers_in_both_scopes() {
        let (mut store, transport, storage) = store();
        transport.respond("/auth/register", 201, TOKEN_BODY);

        let profile = store.register(&registration(), true).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].method, crate::ports::Method::Post);
        match &sent[0].body {
            crate::ports::RequestBody::Json(body) => {
                assert_eq!(body["email"], "amal@example.com");
                assert_eq!(body["national_id"], "LB-0042");
                assert_eq!(body["date_of_birth"], "1990-05-14");
                assert!(body.get("middle_name").is_none());
            }
            other => panic!("expected a JSON body, got {:?}", other),
        }
        for scope in [StorageScope::Durable, StorageScope::Ephemeral] {
            assert_eq!(storage.get(scope, TOKEN_KEY).as_deref(), Some("tok-9"));
        }
        assert_eq!(store.state(), AuthState::Authenticated(profile));
    }

    #[tokio::test]
    async fn rejected_registration_stays_anonymous() {
        let (mut store, transport, storage) = store();
        transport.respond("/auth/register", 400, r#"{"detail": "Email already registered"}"#);

        let err = store.register(&registration(), true).await.unwrap_err();

        assert_eq!(err.to_string(), "Email already registered");
        assert_eq!(store.state(), AuthState::Anonymous);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn refresh_rewrites_the_remembered_copy() {
        let (mut store, transport, storage) = store();
        transport.respond("/auth/login", 200, TOKEN_BODY);
        store.login(&credentials(), true).await.unwrap();
        transport.respond(
            "/auth/me",
            200,
            r#"{"account_id": 9, "email": "amal.new@example.com", "role": "citizen"}"#,
        );

        store.current_user().await.unwrap();

        let durable = storage.get(StorageScope::Durable, PROFILE_KEY).unwrap();
        let durable: SessionProfile = serde_json::from_str(&durable).unwrap();
        assert_eq!(durable.email, "amal.new@example.com");
        assert_eq!(
            storage.get(StorageScope::Durable, TOKEN_KEY).as_deref(),
            Some("tok-9")
        );
    }

    #[tokio::test]
    async fn refresh_of_session_only_login_leaves_durable_scope_empty() {
        let (mut store, transport, storage) = store();
        transport.respond("/auth/login", 200, TOKEN_BODY);
        store.login(&credentials(), false).await.unwrap();
        transport.respond(
            "/auth/me",
            200,
            r#"{"account_id": 9, "email": "amal@example.com", "role": "citizen"}"#,
        );

        store.current_user().await.unwrap();

        assert!(storage.get(StorageScope::Durable, TOKEN_KEY).is_none());
        assert!(storage.get(StorageScope::Durable, PROFILE_KEY).is_none());
    }

    #[tokio::test]
    async fn role_gate_distinguishes_anonymous_from_wrong_role() {
        let (mut store, transport, _storage) = store();
        assert_eq!(store.require_role(&Role::Employee), Access::LoginRequired);

        transport.respond("/auth/login", 200, TOKEN_BODY);
        store.login(&credentials(), false).await.unwrap();

        assert_eq!(store.require_role(&Role::Employee), Access::Denied);
        assert_eq!(store.require_role(&Role::Citizen), Access::Granted);
    }

    #[test]
    fn restore_copies_remembered_session_into_ephemeral_scope() {
        let transport = Arc::new(ScriptedTransport::new());
        let storage = Arc::new(MemoryStorage::default());
        storage.set(StorageScope::Durable, TOKEN_KEY, "kept").unwrap();
        storage
            .set(
                StorageScope::Durable,
                PROFILE_KEY,
                r#"{"user_id": 2, "email": "k@example.com", "role": "employee"}"#,
            )
            .unwrap();

        let store = AuthStore::restore(ApiClient::new(transport, storage.clone()));

        assert_eq!(storage.get(StorageScope::Ephemeral, TOKEN_KEY).as_deref(), Some("kept"));
        assert!(store.has_role(&Role::Employee));
    }
}
