use lifetag_uuid::ProfileId;

/// Errors returned by the LifeTag core.
///
/// The authentication variants deliberately carry no detail: their `Display` text is what a
/// requester may be shown. Internal detail (why a credential was refused) travels on the
/// access event instead, see [`crate::access::DenialReason`].
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("profile not found: {0}")]
    NotFound(ProfileId),
    #[error("authentication required")]
    AuthenticationRequired,
    #[error("access denied")]
    AuthenticationFailed,
    #[error("configuration inconsistent: {0}")]
    ConfigurationInconsistent(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid text: {0}")]
    Text(#[from] lifetag_types::TextError),
    #[error("invalid profile id: {0}")]
    Uuid(#[from] lifetag_uuid::UuidError),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read profile file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write profile file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("translation error: {0}")]
    Translation(String),
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl CoreError {
    /// True for the authentication-path failures that must render as a generic denial.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            CoreError::AuthenticationRequired | CoreError::AuthenticationFailed
        )
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_errors_do_not_leak_detail() {
        assert_eq!(CoreError::AuthenticationFailed.to_string(), "access denied");
        assert_eq!(
            CoreError::AuthenticationRequired.to_string(),
            "authentication required"
        );
    }

    #[test]
    fn is_denial_covers_only_authentication_path() {
        assert!(CoreError::AuthenticationFailed.is_denial());
        assert!(CoreError::AuthenticationRequired.is_denial());
        assert!(!CoreError::NotFound(ProfileId::new()).is_denial());
        assert!(!CoreError::ConfigurationInconsistent("x".into()).is_denial());
    }
}
