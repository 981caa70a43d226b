//! Session gate and credential storage.
//!
//! The gate only checks that a credential is present. Whether the backend
//! still honors it is discovered on the next customer call.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::backend_client::AuthBackend;
use crate::credential_integrity::SealedCredential;
use crate::errors::{ClientError, ResultExt};

/// Client-local storage for the opaque session credential.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<String>, ClientError>;
    fn store(&self, token: &str) -> Result<(), ClientError>;
    fn clear(&self) -> Result<(), ClientError>;
}

impl<S: SessionStorage + ?Sized> SessionStorage for &S {
    fn load(&self) -> Result<Option<String>, ClientError> {
        (**self).load()
    }

    fn store(&self, token: &str) -> Result<(), ClientError> {
        (**self).store(token)
    }

    fn clear(&self) -> Result<(), ClientError> {
        (**self).clear()
    }
}

/// In-process storage. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    token: Mutex<Option<String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, ClientError> {
        self.token
            .lock()
            .map_err(|_| ClientError::Storage("session storage lock poisoned".to_string()))
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<String>, ClientError> {
        Ok(self.slot()?.clone())
    }

    fn store(&self, token: &str) -> Result<(), ClientError> {
        *self.slot()? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.slot()? = None;
        Ok(())
    }
}

/// Persists the credential in a JSON file so it survives restarts.
///
/// No expiry is recorded; the file stays until `clear` or a new login.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<String>, ClientError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Reading session file {}", self.path.display())
                })
            }
        };

        Ok(SealedCredential::unseal(&content))
    }

    fn store(&self, token: &str) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating session directory {}", parent.display()))?;
        }
        let json = SealedCredential::new(token.to_string()).to_json()?;
        fs::write(&self.path, json)
            .with_context(|| format!("Writing session file {}", self.path.display()))?;
        tracing::debug!("Session stored at {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| {
                format!("Removing session file {}", self.path.display())
            }),
        }
    }
}

/// The credential of an entered session, passed explicitly to whatever
/// talks to the backend on the user's behalf.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionContext {
    token: String,
}

impl SessionContext {
    pub fn new(token: String) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Outcome of a gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// A credential is stored; the protected view may render.
    Allow(SessionContext),
    /// No credential; send the user to the login entry point.
    RedirectToLogin,
}

/// Decides whether the customer view is reachable.
pub struct SessionGate<S> {
    storage: S,
}

impl<S: SessionStorage> SessionGate<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Presence check only. A storage failure counts as "not signed in".
    pub fn check(&self) -> GateDecision {
        match self.storage.load() {
            Ok(Some(token)) if !token.trim().is_empty() => {
                GateDecision::Allow(SessionContext::new(token))
            }
            Ok(_) => {
                tracing::debug!("No stored session; redirecting to login");
                GateDecision::RedirectToLogin
            }
            Err(e) => {
                tracing::warn!("Could not read stored session: {}", e);
                GateDecision::RedirectToLogin
            }
        }
    }

    /// Signs in and stores the returned credential.
    ///
    /// A rejected login leaves storage untouched and returns
    /// `ClientError::AuthFailed` carrying the message to display.
    pub async fn login<A>(
        &self,
        auth: &A,
        email: &str,
        password: &str,
    ) -> Result<SessionContext, ClientError>
    where
        A: AuthBackend + ?Sized,
    {
        let token = auth.login(email, password).await?;
        self.storage.store(&token)?;
        Ok(SessionContext::new(token))
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        self.storage.clear()?;
        tracing::info!("Signed out");
        Ok(())
    }
}
