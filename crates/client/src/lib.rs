//! QuizDeck session and authentication client.
//!
//! Manages the locally cached authentication token and user profile against
//! the QuizDeck REST backend.
//!
//! This crate provides:
//! - Session lifecycle: login, registration pass-through, logout
//! - Persisted sessions that survive restarts (and only restarts: logout
//!   clears them)
//! - Concurrency-guarded background token validation with forced sign-out
//!   on 401/403
//! - A watch channel broadcasting session changes to display-state consumers
//! - The multipart profile-update collaborator

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod profile;
pub mod session;
pub mod store;
pub mod types;

pub use api::BackendClient;
pub use config::ClientConfig;
pub use error::{AuthError, AuthResult};
pub use events::SessionState;
pub use profile::{ImageUpload, ProfileUpdate};
pub use session::SessionManager;
pub use store::SessionStore;
pub use types::{Credentials, LoginPayload, Registration, UserRecord, UserRole};
