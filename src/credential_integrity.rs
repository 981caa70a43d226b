use hex;
use sha2::{Digest, Sha256};

use crate::errors::ClientError;

/// Integrity envelope for the persisted session credential.
///
/// The session file lives in a user-writable location and is read back on
/// every command. A hand-edited or truncated file must read as "no session"
/// rather than as a garbled bearer token:
/// 1. A SHA-256 checksum is computed when the token is stored
/// 2. The checksum is verified when the token is loaded
/// 3. Mismatches are logged and treated as an absent credential
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SealedCredential {
    /// The opaque session token.
    pub token: String,
    /// SHA-256 checksum of the token (hex encoded).
    pub checksum: String,
}

impl SealedCredential {
    /// Wraps a token with its checksum.
    pub fn new(token: String) -> Self {
        let checksum = Self::compute_checksum(&token);
        Self { token, checksum }
    }

    fn compute_checksum(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Returns true if the checksum matches the token.
    pub fn is_valid(&self) -> bool {
        Self::compute_checksum(&self.token) == self.checksum
    }

    /// Serializes the envelope for writing to disk.
    pub fn to_json(&self) -> Result<String, ClientError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ClientError::Storage(format!("Failed to encode session: {}", e)))
    }

    /// Parses and verifies a stored envelope.
    ///
    /// Returns `Some(token)` when intact, `None` when the content is not a
    /// sealed credential or the checksum does not match.
    pub fn unseal(serialized: &str) -> Option<String> {
        let entry: SealedCredential = serde_json::from_str(serialized).ok()?;

        if entry.is_valid() {
            Some(entry.token)
        } else {
            tracing::warn!(
                "Stored session failed integrity check (token length {}); ignoring it",
                entry.token.len()
            );
            None
        }
    }
}
