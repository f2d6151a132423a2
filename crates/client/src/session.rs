//! Session lifecycle management.
//!
//! `SessionManager` owns the authenticated session: the cached bearer token,
//! the cached user record, and the flag guarding background validation. The
//! composition root creates one and shares it by reference; there is no
//! process-wide global.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use reqwest::StatusCode;
use tokio::sync::watch;

use crate::api::BackendClient;
use crate::config::ClientConfig;
use crate::error::{AuthError, AuthResult};
use crate::events::{SessionNotifier, SessionState};
use crate::profile::ProfileUpdate;
use crate::store::SessionStore;
use crate::types::{Credentials, Registration, UserRecord, UserRole};

/// Token and user travel together; one without the other never exists here.
#[derive(Debug, Clone)]
struct ActiveSession {
    token: String,
    user: UserRecord,
}

/// Owns the authenticated session and its lifecycle.
pub struct SessionManager {
    api: BackendClient,
    store: SessionStore,
    current: RwLock<Option<ActiveSession>>,
    validation_in_flight: AtomicBool,
    notifier: SessionNotifier,
}

impl SessionManager {
    /// Create a manager from configuration, recovering any persisted session.
    pub fn new(config: &ClientConfig) -> Self {
        let api = BackendClient::with_timeout(
            &config.base_url(),
            Duration::from_secs(config.request_timeout_secs),
        );
        let store = SessionStore::new(config.session_dir.clone());
        Self::with_parts(api, store)
    }

    /// Create a manager over explicit collaborators.
    pub fn with_parts(api: BackendClient, store: SessionStore) -> Self {
        let current = store
            .load()
            .map(|(token, user)| ActiveSession { token, user });

        if let Some(session) = &current {
            tracing::debug!(
                user = %session.user.user_name,
                token_prefix = %token_prefix(&session.token),
                "Recovered persisted session"
            );
        }

        let initial = match &current {
            Some(session) => SessionState::SignedIn(session.user.clone()),
            None => SessionState::SignedOut,
        };

        Self {
            api,
            store,
            current: RwLock::new(current),
            validation_in_flight: AtomicBool::new(false),
            notifier: SessionNotifier::new(initial),
        }
    }

    /// Sign in. On success the session is set and persisted together; on any
    /// failure it is left exactly as it was.
    pub async fn login(&self, credentials: &Credentials) -> AuthResult<UserRecord> {
        let payload = self.api.login(credentials).await?;
        let token = payload
            .issued_token()
            .ok_or(AuthError::MissingToken)?
            .to_string();
        let user = payload.user;

        self.store.save(&token, &user)?;
        tracing::debug!(token_prefix = %token_prefix(&token), "Session persisted");

        self.replace(Some(ActiveSession {
            token,
            user: user.clone(),
        }));
        self.notifier.publish(SessionState::SignedIn(user.clone()));
        tracing::info!(user = %user.user_name, role = %user.role, "Signed in");
        Ok(user)
    }

    /// Pass-through registration; session state is never touched.
    pub async fn register(&self, registration: &Registration) -> AuthResult<serde_json::Value> {
        self.api.register(registration).await
    }

    /// Drop the session everywhere: memory, disk, and subscribers. Safe to
    /// call when already signed out.
    pub fn logout(&self) {
        self.replace(None);
        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %err, "Failed to clear persisted session");
        }
        self.notifier.publish(SessionState::SignedOut);
        tracing::info!("Signed out");
    }

    /// True iff both token and user are cached. Pure, no I/O.
    pub fn is_authenticated(&self) -> bool {
        self.with_session(|session| session.is_some())
    }

    /// True iff authenticated with the teacher role.
    pub fn is_teacher(&self) -> bool {
        self.with_session(|session| {
            matches!(session, Some(active) if active.user.role == UserRole::Teacher)
        })
    }

    /// Headers for backend JSON requests: always `Content-Type`, plus
    /// `Authorization: Bearer <token>` while a session is active.
    pub fn authorization_header(&self) -> HashMap<String, String> {
        let mut headers = HashMap::from([(
            "Content-Type".to_string(),
            "application/json".to_string(),
        )]);
        if let Some(token) = self.token() {
            headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }
        headers
    }

    /// Background check that the cached token is still accepted.
    ///
    /// At most one probe is in flight at a time: a caller arriving while one
    /// is outstanding is told `true` (assume still valid) instead of issuing
    /// a duplicate request. A 401/403 probe response signs the session out;
    /// a transport failure only reports `false` and keeps the session, since
    /// an unreachable server says nothing about token validity.
    pub async fn validate_token(&self) -> bool {
        if self.validation_in_flight.load(Ordering::Acquire) {
            return true;
        }

        let Some(token) = self.token() else {
            return false;
        };

        // Exactly one caller may hold the flag; losing the race here is the
        // same as having observed it already set above.
        if self
            .validation_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return true;
        }
        let _in_flight = InFlightGuard(&self.validation_in_flight);

        match self.api.probe_questions(&token).await {
            Ok(StatusCode::UNAUTHORIZED) | Ok(StatusCode::FORBIDDEN) => {
                tracing::info!("Token rejected by backend, signing out");
                self.logout();
                false
            }
            Ok(status) => {
                tracing::debug!(status = %status, "Validation probe completed");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "Validation probe did not complete");
                false
            }
        }
    }

    /// Guard for teacher-only actions: authenticated, teacher role, and a
    /// token the backend still accepts.
    pub async fn check_permissions(&self) -> AuthResult<bool> {
        if !self.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }
        if !self.is_teacher() {
            return Err(AuthError::InsufficientRole);
        }
        Ok(self.validate_token().await)
    }

    /// Save profile edits. Replaces the cached and persisted user record;
    /// the token is untouched.
    pub async fn update_profile(&self, update: ProfileUpdate) -> AuthResult<UserRecord> {
        let Some(session) = self.with_session(|session| session.cloned()) else {
            return Err(AuthError::NotAuthenticated);
        };

        let user = self
            .api
            .update_user(&session.token, session.user.id, update)
            .await?;

        self.store.save(&session.token, &user)?;
        self.replace(Some(ActiveSession {
            token: session.token,
            user: user.clone(),
        }));
        self.notifier.publish(SessionState::SignedIn(user.clone()));
        tracing::info!(user = %user.user_name, "Profile updated");
        Ok(user)
    }

    /// Clone of the signed-in user, if any.
    pub fn current_user(&self) -> Option<UserRecord> {
        self.with_session(|session| session.map(|active| active.user.clone()))
    }

    /// Subscribe to session state changes. Receivers re-render from the new
    /// value; they must not answer it with a validation request.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.notifier.subscribe()
    }

    fn token(&self) -> Option<String> {
        self.with_session(|session| session.map(|active| active.token.clone()))
    }

    fn with_session<T>(&self, read: impl FnOnce(Option<&ActiveSession>) -> T) -> T {
        let guard = match self.current.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        read(guard.as_ref())
    }

    fn replace(&self, next: Option<ActiveSession>) {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = next;
    }
}

/// Clears the in-flight flag on drop, so every exit path releases it.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Loggable prefix of an opaque token; never the whole value.
fn token_prefix(token: &str) -> String {
    token.chars().take(8).collect()
}
