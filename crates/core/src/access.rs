//! Access requests, grants, events and the per-request session state machine.

use crate::visibility::FieldGroup;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use lifetag_uuid::ProfileId;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Requester tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Public,
    Medical,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::Public => f.write_str("public"),
            AccessLevel::Medical => f.write_str("medical"),
        }
    }
}

/// A medical-view PIN as presented by a requester.
///
/// `Debug` is redacted so a credential can sit inside logged structures without leaking.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(pin: impl Into<String>) -> Self {
        Self(pin.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// One requester's attempt to view a profile. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessRequest {
    pub requested_level: AccessLevel,
    pub credential: Option<Credential>,
}

impl AccessRequest {
    pub fn public() -> Self {
        Self {
            requested_level: AccessLevel::Public,
            credential: None,
        }
    }

    pub fn medical(credential: Option<Credential>) -> Self {
        Self {
            requested_level: AccessLevel::Medical,
            credential,
        }
    }
}

/// Something a grant can reveal: a toggleable field-group, or the critical alert which no
/// setting can hide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VisibleField {
    CriticalAlert,
    Group(FieldGroup),
}

impl VisibleField {
    pub fn key(self) -> &'static str {
        match self {
            VisibleField::CriticalAlert => "criticalAlert",
            VisibleField::Group(group) => group.key(),
        }
    }
}

impl Serialize for VisibleField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.key())
    }
}

impl From<FieldGroup> for VisibleField {
    fn from(group: FieldGroup) -> Self {
        VisibleField::Group(group)
    }
}

/// Evaluator output: the level granted and exactly what may be rendered.
///
/// Created per request and discarded once the response is rendered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    pub level: AccessLevel,
    pub visible_fields: BTreeSet<VisibleField>,
}

impl AccessGrant {
    pub fn reveals(&self, field: impl Into<VisibleField>) -> bool {
        self.visible_fields.contains(&field.into())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessOutcome {
    Granted,
    Denied,
}

/// Why a medical request was refused. Recorded on access events only; requesters see a
/// generic denial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DenialReason {
    CredentialMissing,
    CredentialRejected,
    VerifierTimeout,
}

impl DenialReason {
    /// The requester-facing error for this reason.
    pub fn to_error(self) -> CoreError {
        match self {
            DenialReason::CredentialMissing => CoreError::AuthenticationRequired,
            DenialReason::CredentialRejected | DenialReason::VerifierTimeout => {
                CoreError::AuthenticationFailed
            }
        }
    }
}

/// Record of one evaluated request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessEvent {
    pub profile_id: ProfileId,
    pub level: AccessLevel,
    pub timestamp: DateTime<Utc>,
    pub outcome: AccessOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial_reason: Option<DenialReason>,
}

/// State of one access session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Viewing at the public tier; no credential presented yet.
    Unauthenticated,
    /// A credential has been presented and is being checked.
    Verifying,
    /// Medical access granted. Terminal.
    Authenticated,
    /// Medical access refused; the requester stays on the public tier. Terminal.
    Denied(DenialReason),
}

/// Per-request access session: `Unauthenticated -> Verifying -> Authenticated | Denied`.
///
/// Sessions are never persisted and never reopened; retrying means starting a new session.
#[derive(Clone, Debug)]
pub struct AccessSession {
    state: SessionState,
}

impl Default for AccessSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Unauthenticated,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Level the requester currently holds.
    pub fn level(&self) -> AccessLevel {
        match self.state {
            SessionState::Authenticated => AccessLevel::Medical,
            _ => AccessLevel::Public,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            SessionState::Authenticated | SessionState::Denied(_)
        )
    }

    /// A credential was presented.
    pub fn begin_verification(&mut self) -> CoreResult<()> {
        self.transition(SessionState::Unauthenticated, SessionState::Verifying)
    }

    /// Medical access was granted, either after verification or directly when no PIN is
    /// required.
    pub fn authenticate(&mut self) -> CoreResult<()> {
        match self.state {
            SessionState::Unauthenticated | SessionState::Verifying => {
                self.state = SessionState::Authenticated;
                Ok(())
            }
            other => Err(invalid_transition(other, "Authenticated")),
        }
    }

    /// Medical access was refused.
    pub fn deny(&mut self, reason: DenialReason) -> CoreResult<()> {
        match self.state {
            SessionState::Unauthenticated | SessionState::Verifying => {
                self.state = SessionState::Denied(reason);
                Ok(())
            }
            other => Err(invalid_transition(other, "Denied")),
        }
    }

    fn transition(&mut self, from: SessionState, to: SessionState) -> CoreResult<()> {
        if self.state != from {
            return Err(invalid_transition(self.state, &format!("{to:?}")));
        }
        self.state = to;
        Ok(())
    }
}

fn invalid_transition(from: SessionState, to: &str) -> CoreError {
    CoreError::InvalidInput(format!(
        "invalid access session transition from {from:?} to {to}"
    ))
}
