//! Disclosure Policy Evaluator.
//!
//! Maps `(Profile, VisibilitySettings, AccessRequest)` to an [`AccessGrant`] or a generic
//! denial. The evaluator holds no per-request state and never mutates its inputs, so one
//! instance can be shared behind an `Arc` and called concurrently.
//!
//! ## Decision
//!
//! - `public` requests are always granted the public field set.
//! - `medical` requests are granted directly when the owner does not require a PIN.
//! - Otherwise a credential must be presented and accepted by the [`PinVerifier`] within the
//!   configured budget. A missing credential is `AuthenticationRequired`; a rejected,
//!   malformed or timed-out one is `AuthenticationFailed`. No grant is built on failure.
//!
//! ## Side effects
//!
//! Only after the decision is final: one [`AccessEvent`] goes to the [`AccessLogSink`] when
//! the owner enabled access logging, and granted medical access triggers an owner
//! notification when enabled. Sink failures are logged and otherwise ignored; they cannot
//! change the decision.

use crate::access::{
    AccessEvent, AccessGrant, AccessLevel, AccessOutcome, AccessRequest, AccessSession,
    DenialReason, SessionState,
};
use crate::collaborators::{AccessLogSink, NotificationSink, PinVerdict, PinVerifier};
use crate::config::CoreConfig;
use crate::policy;
use crate::profile::Profile;
use crate::validation::validate_pin_format;
use crate::visibility::VisibilitySettings;
use crate::{CoreError, CoreResult};
use chrono::Utc;
use lifetag_uuid::ProfileId;
use std::sync::Arc;
use std::time::Duration;

/// Evaluates access requests against a profile's visibility settings.
#[derive(Clone)]
pub struct DisclosureEvaluator {
    pin_verifier: Arc<dyn PinVerifier>,
    access_log: Arc<dyn AccessLogSink>,
    notifications: Arc<dyn NotificationSink>,
    pin_timeout: Duration,
}

impl DisclosureEvaluator {
    pub fn new(
        cfg: &CoreConfig,
        pin_verifier: Arc<dyn PinVerifier>,
        access_log: Arc<dyn AccessLogSink>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            pin_verifier,
            access_log,
            notifications,
            pin_timeout: cfg.pin_verification_timeout(),
        }
    }

    /// Decides what `request` may see of `profile`.
    ///
    /// # Errors
    ///
    /// - [`crate::CoreError::AuthenticationRequired`] for a PIN-gated medical request with no
    ///   credential.
    /// - [`crate::CoreError::AuthenticationFailed`] when the credential is malformed, rejected,
    ///   or the verifier does not answer in time.
    pub async fn evaluate(
        &self,
        profile: &Profile,
        settings: &VisibilitySettings,
        request: &AccessRequest,
    ) -> CoreResult<AccessGrant> {
        let profile_id = profile.id();
        let session = self.run_session(profile_id, settings, request).await?;

        if request.requested_level == AccessLevel::Medical && !session.is_terminal() {
            return Err(CoreError::InvalidInput(format!(
                "medical access session for {} ended in {:?}",
                profile_id,
                session.state()
            )));
        }

        let decision = match session.state() {
            SessionState::Denied(reason) => Err(reason),
            _ => Ok(policy::grant_for(session.level(), settings)),
        };

        self.report(profile_id, settings, request.requested_level, &decision);

        decision.map_err(DenialReason::to_error)
    }

    async fn run_session(
        &self,
        profile_id: &ProfileId,
        settings: &VisibilitySettings,
        request: &AccessRequest,
    ) -> CoreResult<AccessSession> {
        let mut session = AccessSession::new();

        if request.requested_level == AccessLevel::Public {
            return Ok(session);
        }

        if !settings.require_pin_for_medical_view {
            session.authenticate()?;
            return Ok(session);
        }

        let Some(credential) = request.credential.as_ref() else {
            session.deny(DenialReason::CredentialMissing)?;
            return Ok(session);
        };

        session.begin_verification()?;

        if validate_pin_format(credential.expose()).is_err() {
            session.deny(DenialReason::CredentialRejected)?;
            return Ok(session);
        }

        let verdict = tokio::time::timeout(
            self.pin_timeout,
            self.pin_verifier.verify(profile_id, credential),
        )
        .await
        .unwrap_or(PinVerdict::Timeout);

        match verdict {
            PinVerdict::Valid => session.authenticate()?,
            PinVerdict::Invalid => session.deny(DenialReason::CredentialRejected)?,
            PinVerdict::Timeout => session.deny(DenialReason::VerifierTimeout)?,
        }

        Ok(session)
    }

    fn report(
        &self,
        profile_id: &ProfileId,
        settings: &VisibilitySettings,
        requested_level: AccessLevel,
        decision: &Result<AccessGrant, DenialReason>,
    ) {
        let event = match decision {
            Ok(grant) => AccessEvent {
                profile_id: profile_id.clone(),
                level: grant.level,
                timestamp: Utc::now(),
                outcome: AccessOutcome::Granted,
                denial_reason: None,
            },
            Err(reason) => AccessEvent {
                profile_id: profile_id.clone(),
                level: requested_level,
                timestamp: Utc::now(),
                outcome: AccessOutcome::Denied,
                denial_reason: Some(*reason),
            },
        };

        tracing::debug!(
            profile = %profile_id,
            level = %event.level,
            outcome = ?event.outcome,
            reason = ?event.denial_reason,
            "access evaluated"
        );

        if settings.log_access_attempts {
            if let Err(e) = self.access_log.record(&event) {
                tracing::warn!(profile = %profile_id, "failed to record access event: {}", e);
            }
        }

        let granted_medical =
            event.outcome == AccessOutcome::Granted && event.level == AccessLevel::Medical;
        if settings.notify_on_access && granted_medical {
            if let Err(e) = self.notifications.notify_owner(profile_id, &event) {
                tracing::warn!(profile = %profile_id, "failed to notify profile owner: {}", e);
            }
        }
    }
}
