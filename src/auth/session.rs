use crate::auth::AuthError;
use crate::auth::token::{decode_claims, numeric_claim};

const ROLE_CLAIMS: [&str; 4] = ["ROLE", "role", "rol", "roleId"];
const USER_CLAIMS: [&str; 2] = ["ID", "id"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Administrator,
    Driver,
}

impl Role {
    pub fn from_id(role_id: i64) -> Option<Self> {
        match role_id {
            2 => Some(Role::Administrator),
            104 => Some(Role::Driver),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Administrator => "administrador",
            Role::Driver => "conductor",
        }
    }
}

/// The signed-in user, derived from the bearer token.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthSession {
    token: Option<String>,
    role_id: Option<i64>,
    user_id: Option<i64>,
    traccar_base_url: Option<String>,
}

impl AuthSession {
    pub fn new(token: Option<String>, role_id: Option<i64>, user_id: Option<i64>, traccar_base_url: Option<String>) -> Self {
        AuthSession {
            token: token.filter(|token| !token.is_empty()),
            role_id,
            user_id,
            traccar_base_url,
        }
    }

    pub fn from_token(token: &str) -> Result<Self, AuthError> {
        let claims = decode_claims(token)?;

        Ok(AuthSession::new(
            Some(token.to_string()),
            numeric_claim(&claims, &ROLE_CLAIMS),
            numeric_claim(&claims, &USER_CLAIMS),
            None,
        ))
    }

    #[cfg(test)]
    pub fn with_token(token: &str) -> Self {
        AuthSession::new(Some(token.to_string()), None, None, None)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn role_id(&self) -> Option<i64> {
        self.role_id
    }

    pub fn role(&self) -> Option<Role> {
        self.role_id.and_then(Role::from_id)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.role_id.is_some() && self.user_id.is_some()
    }

    pub fn traccar_base_url(&self) -> Option<&str> {
        self.traccar_base_url.as_deref()
    }

    pub fn set_traccar_base_url(&mut self, traccar_base_url: Option<String>) {
        self.traccar_base_url = traccar_base_url;
    }

    /// Drops the identity but keeps device-level settings.
    pub fn cleared(&self) -> Self {
        AuthSession {
            traccar_base_url: self.traccar_base_url.clone(),
            ..Default::default()
        }
    }
}
