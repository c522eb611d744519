//! Shared application state
//!
//! Built once at startup and handed to every request handler. Nothing in
//! here changes after construction.

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use log::warn;
use std::sync::Arc;

use crate::auth::CredentialStore;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::storage::Root;

#[derive(Clone)]
pub struct AppState {
    root: Arc<Root>,
    credentials: Arc<CredentialStore>,
    cookie_key: Key,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        root: Root,
        credentials: CredentialStore,
        cookie_key: Key,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            root: Arc::new(root),
            credentials: Arc::new(credentials),
            cookie_key,
            max_upload_bytes,
        }
    }

    /// Opens the root and loads credentials as described by `config`.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let root_path = config.server_root_path();
        let root = Root::new(&root_path).map_err(|source| ServerError::Root {
            path: root_path.display().to_string(),
            source,
        })?;
        let credentials = CredentialStore::load(&config.users_file_path())?;

        let cookie_key = match &config.cookie_secret {
            Some(secret) => Key::try_from(secret.as_bytes()).map_err(|_| {
                ServerError::Config(config::ConfigError::Message(
                    "cookie_secret is too short".into(),
                ))
            })?,
            None => {
                warn!("No cookie_secret configured; sessions will not survive a restart");
                Key::generate()
            }
        };

        Ok(Self::new(
            root,
            credentials,
            cookie_key,
            config.max_upload_size_bytes(),
        ))
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
