//! Interfaces the core consumes but does not implement.
//!
//! Stock implementations live in [`crate::repositories`]; integrating applications provide
//! their own for real persistence, credential checks and delivery.

use crate::access::{AccessEvent, Credential};
use crate::profile::Profile;
use crate::visibility::VisibilitySettings;
use crate::CoreResult;
use lifetag_uuid::ProfileId;

/// Source of emergency profiles.
pub trait ProfileStore: Send + Sync {
    /// Returns the profile, or [`crate::CoreError::NotFound`] if the id is unknown.
    fn get(&self, id: &ProfileId) -> CoreResult<Profile>;

    /// Inserts or replaces a profile.
    fn put(&self, profile: Profile) -> CoreResult<()>;

    /// Ids of all stored profiles.
    fn list(&self) -> CoreResult<Vec<ProfileId>>;
}

/// Source of per-profile visibility settings.
pub trait VisibilitySettingsStore: Send + Sync {
    /// Returns the stored settings, or defaults when none were ever saved.
    fn get(&self, profile_id: &ProfileId) -> CoreResult<VisibilitySettings>;

    fn put(&self, profile_id: &ProfileId, settings: VisibilitySettings) -> CoreResult<()>;
}

/// Result of checking a medical-view PIN.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinVerdict {
    Valid,
    Invalid,
    /// The verifier could not decide in time (reported by the verifier itself).
    Timeout,
}

/// Checks a presented PIN for a profile.
#[async_trait::async_trait]
pub trait PinVerifier: Send + Sync {
    async fn verify(&self, profile_id: &ProfileId, credential: &Credential) -> PinVerdict;
}

/// Delivery failure from a sink. Never surfaces to requesters.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Receives one event per evaluated request when access logging is enabled.
///
/// Best-effort: the evaluator ignores (and logs) any error.
pub trait AccessLogSink: Send + Sync {
    fn record(&self, event: &AccessEvent) -> Result<(), SinkError>;
}

/// Out-of-band notification to the profile owner. Must not block on delivery.
pub trait NotificationSink: Send + Sync {
    fn notify_owner(&self, profile_id: &ProfileId, event: &AccessEvent) -> Result<(), SinkError>;
}
