//! Persistent session storage.
//!
//! The session survives restarts as two entries under the session directory:
//! `token` (raw bearer string, mode 0600 on Unix) and `user.json`. Both are
//! written on login and removed on logout. A directory holding only one of
//! the two, or unparseable contents, reads back as no session.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AuthResult;
use crate::types::UserRecord;

const TOKEN_FILE: &str = "token";
const USER_FILE: &str = "user.json";

/// File-backed store for the persisted session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Create a store rooted at the given directory. The directory itself is
    /// only created on the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the raw token entry.
    pub fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    /// Path of the serialized user record.
    pub fn user_path(&self) -> PathBuf {
        self.dir.join(USER_FILE)
    }

    /// Read the persisted session, if both entries are present and intact.
    pub fn load(&self) -> Option<(String, UserRecord)> {
        let token = fs::read_to_string(self.token_path()).ok()?;
        let token = token.trim().to_string();
        if token.is_empty() {
            return None;
        }
        let user = load_json::<UserRecord>(&self.user_path())?;
        Some((token, user))
    }

    /// Persist both session entries, creating the directory if needed.
    /// The token is written last so a torn save reads back as no session.
    pub fn save(&self, token: &str, user: &UserRecord) -> AuthResult<()> {
        fs::create_dir_all(&self.dir)?;
        save_json(&self.user_path(), user)?;
        write_secret(&self.token_path(), token)?;
        Ok(())
    }

    /// Remove both session entries. Already-absent entries are fine.
    pub fn clear(&self) -> AuthResult<()> {
        remove_if_present(&self.token_path())?;
        remove_if_present(&self.user_path())?;
        Ok(())
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
}

fn save_json<T: serde::Serialize>(path: &Path, data: &T) -> AuthResult<()> {
    fs::write(path, serde_json::to_string_pretty(data)?)?;
    Ok(())
}

fn write_secret(path: &Path, value: &str) -> AuthResult<()> {
    fs::write(path, value)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

fn remove_if_present(path: &Path) -> AuthResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserRole;
    use tempfile::TempDir;

    fn sample_user() -> UserRecord {
        UserRecord {
            id: 1,
            email: "ana@example.com".to_string(),
            user_name: "Ana".to_string(),
            role: UserRole::Teacher,
            image: None,
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::new(tmp.path().join("session"));

        store.save("t1", &sample_user()).unwrap();
        let (token, user) = store.load().unwrap();
        assert_eq!(token, "t1");
        assert_eq!(user, sample_user());
    }

    #[test]
    fn test_missing_dir_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::new(tmp.path().join("nope"));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_partial_state_reads_as_no_session() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::new(tmp.path());

        fs::write(store.token_path(), "t1").unwrap();
        assert!(store.load().is_none());

        fs::remove_file(store.token_path()).unwrap();
        fs::write(store.user_path(), serde_json::to_string(&sample_user()).unwrap()).unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_corrupt_user_reads_as_no_session() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::new(tmp.path());

        fs::write(store.token_path(), "t1").unwrap();
        fs::write(store.user_path(), "{not json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::new(tmp.path());

        store.clear().unwrap();
        store.save("t1", &sample_user()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().is_none());
        assert!(!store.token_path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_token_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let store = SessionStore::new(tmp.path());
        store.save("t1", &sample_user()).unwrap();

        let mode = fs::metadata(store.token_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
