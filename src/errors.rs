use std::fmt;

/// Default message shown when a login is rejected without a usable reason.
pub const DEFAULT_LOGIN_FAILURE: &str = "Login failed. Please check your credentials.";

/// Client-side error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Login rejected. Carries the message to show the user.
    AuthFailed(String),
    /// The backend refused the session credential (401/403).
    Unauthorized(String),
    /// Resource not found, either in the local cache or on the backend.
    NotFound(String),
    /// The backend rejected the request payload (400).
    BadRequest(String),
    /// Transport failure, unexpected status, or unparseable response.
    ExternalApiError(String),
    /// A form field violates one of its native input constraints.
    InvalidForm(String),
    /// The session storage could not be read or written.
    Storage(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<ClientError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::AuthFailed(msg) => write!(f, "Authentication failed: {}", msg),
            ClientError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ClientError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ClientError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ClientError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            ClientError::InvalidForm(msg) => write!(f, "Invalid form: {}", msg),
            ClientError::Storage(msg) => write!(f, "Session storage error: {}", msg),
            ClientError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::WithContext { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl ClientError {
    /// Returns the innermost error, skipping any context wrappers.
    pub fn root(&self) -> &ClientError {
        match self {
            ClientError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Text suitable for showing to the person at the keyboard.
    ///
    /// Login rejections surface the backend's own wording; form violations
    /// surface the constraint that failed. Everything else falls back to the
    /// full display chain.
    pub fn user_message(&self) -> String {
        match self.root() {
            ClientError::AuthFailed(msg) | ClientError::InvalidForm(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.root(), ClientError::Unauthorized(_))
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `ClientError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, ClientError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, ClientError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, ClientError> {
    fn context(self, context: impl Into<String>) -> Result<T, ClientError> {
        self.map_err(|e| ClientError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, ClientError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| ClientError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for io::Error, used by the file-backed session storage.
impl<T> ResultExt<T> for Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, ClientError> {
        self.map_err(|e| ClientError::WithContext {
            source: Box::new(ClientError::Storage(e.to_string())),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, ClientError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| ClientError::WithContext {
            source: Box::new(ClientError::Storage(e.to_string())),
            context: f(),
        })
    }
}
