//! Credential storage
//!
//! Loads the `users.json` credential list once at startup. Entries are
//! compared by plain structural equality; passwords are stored and compared
//! as given.

use log::info;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::ServerError;

/// A username/password pair as it appears in `users.json`.
#[derive(Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Credential {
    #[serde(rename = "name")]
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Read-only set of known credentials.
#[derive(Debug, Default)]
pub struct CredentialStore {
    credentials: HashSet<Credential>,
}

impl CredentialStore {
    pub fn new(credentials: impl IntoIterator<Item = Credential>) -> Self {
        Self {
            credentials: credentials.into_iter().collect(),
        }
    }

    /// Parses a JSON array of `{"name": ..., "password": ...}` records.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let records: Vec<Credential> = serde_json::from_str(json)?;
        Ok(Self::new(records))
    }

    /// Loads the store from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let display = path.display().to_string();
        let json = fs::read_to_string(path).map_err(|source| ServerError::CredentialsIo {
            path: display.clone(),
            source,
        })?;
        let store = Self::from_json(&json).map_err(|source| ServerError::CredentialsFormat {
            path: display.clone(),
            source,
        })?;
        info!("Loaded {} credential(s) from {}", store.len(), display);
        Ok(store)
    }

    pub fn contains(&self, credential: &Credential) -> bool {
        self.credentials.contains(credential)
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_json_reads_name_and_password() {
        let store = CredentialStore::from_json(
            r#"[{"name": "alice", "password": "alice123"}, {"name": "bob", "password": "b"}]"#,
        )
        .unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.contains(&Credential::new("alice", "alice123")));
        assert!(!store.contains(&Credential::new("alice", "b")));
    }

    #[test]
    fn test_load_reports_missing_and_malformed_files() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            CredentialStore::load(&temp.path().join("users.json")),
            Err(ServerError::CredentialsIo { .. })
        ));

        let bad = temp.path().join("bad.json");
        fs::write(&bad, r#"{"name": "not-an-array"}"#).unwrap();
        assert!(matches!(
            CredentialStore::load(&bad),
            Err(ServerError::CredentialsFormat { .. })
        ));
    }

    #[test]
    fn test_debug_hides_password() {
        let debug = format!("{:?}", Credential::new("alice", "hunter2"));
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }
}
