//! API credential handling.

use std::fmt;

/// Required credential prefix.
const CREDENTIAL_PREFIX: &str = "sk-";

/// Credentials must be strictly longer than this.
const MIN_CREDENTIAL_LEN: usize = 20;

/// Secret used to authenticate variation requests.
///
/// Validity is purely syntactic; a valid-looking credential may still be
/// rejected by the remote service.
#[derive(Clone, Default)]
pub struct ApiCredential(String);

impl ApiCredential {
    /// Wraps a secret, trimming surrounding whitespace.
    ///
    /// Validity is checked on the trimmed value, so a key read from a file
    /// or environment variable with a trailing newline is still accepted.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into().trim().to_string())
    }

    /// Reads the credential from an environment variable.
    ///
    /// A missing or non-unicode variable yields an empty (invalid) credential.
    pub fn from_env(var: &str) -> Self {
        match std::env::var(var) {
            Ok(value) => Self::new(value),
            Err(_) => {
                tracing::debug!(var, "Credential variable not set");
                Self::default()
            }
        }
    }

    /// Non-empty, recognized prefix, minimum length.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self.0.starts_with(CREDENTIAL_PREFIX)
            && self.0.len() > MIN_CREDENTIAL_LEN
    }

    /// The raw secret, for building the authorization header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("ApiCredential(<empty>)")
        } else {
            f.write_str("ApiCredential(<redacted>)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_credential() {
        assert!(ApiCredential::new("sk-abcdefghijklmnopqrstuvwx").is_valid());
    }

    #[test]
    fn test_invalid_credentials() {
        assert!(!ApiCredential::new("").is_valid());
        assert!(!ApiCredential::new("pk-abcdefghijklmnopqrstuvwx").is_valid());
        // Exactly 20 characters is too short.
        assert!(!ApiCredential::new("sk-abcdefghijklmnopq").is_valid());
    }

    #[test]
    fn test_whitespace_trimmed() {
        let cred = ApiCredential::new("  sk-abcdefghijklmnopqrstuvwx\n");
        assert!(cred.is_valid());
        assert_eq!(cred.expose(), "sk-abcdefghijklmnopqrstuvwx");
    }

    #[test]
    fn test_debug_redacts() {
        let cred = ApiCredential::new("sk-abcdefghijklmnopqrstuvwx");
        assert!(!format!("{cred:?}").contains("abcdef"));
    }

    #[test]
    fn test_missing_env_is_invalid() {
        let cred = ApiCredential::from_env("IMAGE_VARIATIONS_TEST_UNSET_VARIABLE");
        assert!(!cred.is_valid());
    }
}
