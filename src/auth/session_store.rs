use crate::auth::{AuthError, AuthSession};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PersistedSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    traccar_base_url: Option<String>,
}

/// Persists the session as a small JSON file between runs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<AuthSession, AuthError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("🔑 No stored session found");
                return Ok(AuthSession::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let persisted: PersistedSession = serde_json::from_str(&content)?;
        let session = AuthSession::new(
            persisted.auth_token,
            persisted.role_id,
            persisted.user_id,
            persisted.traccar_base_url,
        );
        info!(authenticated = session.is_authenticated(), "🔑 Loaded stored session");
        Ok(session)
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub async fn save(&self, session: &AuthSession) -> Result<(), AuthError> {
        let role_name = session.role().map(|role| role.name().to_string());
        let persisted = PersistedSession {
            auth_token: session.token().map(str::to_string),
            role_id: session.role_id(),
            role: role_name.clone(),
            rol: role_name,
            user_id: session.user_id(),
            traccar_base_url: session.traccar_base_url().map(str::to_string),
        };

        let content = serde_json::to_string_pretty(&persisted)?;
        fs::write(&self.path, content).await.map_err(|e| self.io_error(e))?;
        info!("🔑 Stored session");
        Ok(())
    }

    /// Replaces `current` with the identity of a freshly issued token and stores it. A token
    /// that cannot be decoded leaves `current` untouched.
    pub async fn sign_in(&self, current: AuthSession, token: &str) -> Result<AuthSession, AuthError> {
        let mut session = match AuthSession::from_token(token) {
            Ok(session) => session,
            Err(e) => {
                warn!("⚠️ Ignoring the configured token: {}", e);
                return Ok(current);
            }
        };

        session.set_traccar_base_url(current.traccar_base_url().map(str::to_string));
        self.save(&session).await?;
        Ok(session)
    }

    pub async fn clear(&self, session: &AuthSession) -> Result<AuthSession, AuthError> {
        let cleared = session.cleared();
        self.save(&cleared).await?;
        Ok(cleared)
    }

    fn io_error(&self, source: io::Error) -> AuthError {
        AuthError::Io {
            source,
            path: self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::encode_token;
    use serde_json::{Value, json};
    use std::env::temp_dir;

    fn store(name: &str) -> SessionStore {
        SessionStore::new(temp_dir().join(format!("routewatch-{}-{}.json", name, std::process::id())))
    }

    #[tokio::test]
    async fn a_missing_file_is_an_empty_session() -> Result<(), AuthError> {
        let session = store("missing").load().await?;
        assert_eq!(session, AuthSession::default());
        Ok(())
    }

    #[tokio::test]
    async fn saves_and_loads_a_session() -> Result<(), AuthError> {
        let store = store("roundtrip");
        let mut session = AuthSession::from_token(&encode_token(&json!({ "ROLE": 2, "ID": 8 })))?;
        session.set_traccar_base_url(Some("http://gps.example.com".to_string()));

        store.save(&session).await?;
        let content: Value = serde_json::from_str(&fs::read_to_string(&store.path).await.unwrap())?;
        let loaded = store.load().await?;

        assert_eq!(content["role"], json!("administrador"));
        assert_eq!(content["rol"], json!("administrador"));
        assert_eq!(content["roleId"], json!(2));
        assert_eq!(loaded, session);

        Ok(())
    }

    #[tokio::test]
    async fn clear_removes_the_identity() -> Result<(), AuthError> {
        let store = store("clear");
        let session = AuthSession::from_token(&encode_token(&json!({ "ROLE": 104, "ID": 3 })))?;
        store.save(&session).await?;

        store.clear(&session).await?;
        let content: Value = serde_json::from_str(&fs::read_to_string(&store.path).await.unwrap())?;

        assert_eq!(content, json!({}));
        assert!(!store.load().await?.is_authenticated());

        Ok(())
    }

    #[tokio::test]
    async fn sign_in_stores_the_new_identity() -> Result<(), AuthError> {
        let store = store("sign-in");
        let mut current = AuthSession::default();
        current.set_traccar_base_url(Some("http://gps.example.com".to_string()));

        let session = store.sign_in(current, &encode_token(&json!({ "ROLE": 104, "ID": 3 }))).await?;

        assert!(session.is_authenticated());
        assert_eq!(session.traccar_base_url(), Some("http://gps.example.com"));
        assert_eq!(store.load().await?, session);

        Ok(())
    }

    #[tokio::test]
    async fn sign_in_with_a_malformed_token_keeps_the_session() -> Result<(), AuthError> {
        let store = store("sign-in-malformed");
        let current = AuthSession::from_token(&encode_token(&json!({ "ROLE": 2, "ID": 8 })))?;

        let session = store.sign_in(current.clone(), "not-a-jwt").await?;

        assert_eq!(session, current);
        assert_eq!(store.load().await?, AuthSession::default());

        Ok(())
    }
}
