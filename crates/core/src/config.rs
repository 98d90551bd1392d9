//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into core services as an
//! `Arc<CoreConfig>`. Nothing in the request path reads process-wide environment variables.

use crate::constants::{DEFAULT_PIN_VERIFICATION_TIMEOUT, PROFILES_DIR_NAME};
use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    profile_data_dir: PathBuf,
    pin_verification_timeout: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if `pin_verification_timeout` is zero, which would
    /// deny every PIN-gated request.
    pub fn new(profile_data_dir: PathBuf, pin_verification_timeout: Duration) -> CoreResult<Self> {
        if pin_verification_timeout.is_zero() {
            return Err(CoreError::InvalidInput(
                "pin_verification_timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            profile_data_dir,
            pin_verification_timeout,
        })
    }

    pub fn profile_data_dir(&self) -> &Path {
        &self.profile_data_dir
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.profile_data_dir.join(PROFILES_DIR_NAME)
    }

    pub fn pin_verification_timeout(&self) -> Duration {
        self.pin_verification_timeout
    }
}

/// Parse the PIN verification budget from an optional millisecond value.
///
/// If `value` is `None` or empty/whitespace, returns the default budget.
pub fn pin_timeout_from_env_value(value: Option<String>) -> CoreResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(raw) = value else {
        return Ok(DEFAULT_PIN_VERIFICATION_TIMEOUT);
    };

    let millis = raw.parse::<u64>().map_err(|_| {
        CoreError::InvalidInput(format!(
            "PIN verification timeout must be a whole number of milliseconds, got '{}'",
            raw
        ))
    })?;

    Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_defaults_when_absent_or_blank() {
        assert_eq!(
            pin_timeout_from_env_value(None).unwrap(),
            DEFAULT_PIN_VERIFICATION_TIMEOUT
        );
        assert_eq!(
            pin_timeout_from_env_value(Some("  ".into())).unwrap(),
            DEFAULT_PIN_VERIFICATION_TIMEOUT
        );
    }

    #[test]
    fn timeout_parses_milliseconds() {
        assert_eq!(
            pin_timeout_from_env_value(Some(" 250 ".into())).unwrap(),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn timeout_rejects_non_numeric() {
        let err = pin_timeout_from_env_value(Some("soon".into())).expect_err("should fail");
        assert!(matches!(err, CoreError::InvalidInput(msg) if msg.contains("soon")));
    }

    #[test]
    fn config_rejects_zero_timeout() {
        let err = CoreConfig::new(PathBuf::from("/tmp"), Duration::ZERO)
            .expect_err("zero timeout should be rejected");
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn profiles_dir_is_under_data_dir() {
        let cfg = CoreConfig::new(PathBuf::from("/data"), Duration::from_secs(1)).unwrap();
        assert_eq!(cfg.profiles_dir(), PathBuf::from("/data/profiles"));
    }
}
