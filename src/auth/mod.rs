mod session;
mod session_store;
mod token;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub use session::AuthSession;
pub use session_store::SessionStore;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("the token is not a JWT")]
    MalformedToken,
    #[error("the token payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid session data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unable to access '{}': {}", path.display(), source)]
    Io { source: io::Error, path: PathBuf },
}
