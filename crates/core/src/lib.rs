//! # LifeTag Core
//!
//! Tiered disclosure of emergency profiles.
//!
//! A wearable tag links to a subject's emergency profile. Anyone who scans it gets the
//! **public** tier: the critical alert plus whichever identity and contact fields the owner
//! left visible. Medical responders may ask for the **medical** tier, which adds conditions,
//! medications, the full allergy list and notes, subject to the owner's settings and, when
//! the owner requires it, a PIN.
//!
//! ## Layout
//!
//! - [`profile`] and [`visibility`]: the owner's data and disclosure preferences.
//! - [`access`]: requests, grants, events and the per-request session.
//! - [`policy`]: pure field-set rules and view rendering.
//! - [`evaluator`]: the decision, including PIN verification and event emission.
//! - [`service`]: store-backed entry points.
//! - [`collaborators`] and [`repositories`]: seams to storage, verification and sinks, with
//!   stock implementations.
//! - [`wire`]: the YAML on-disk form.
//!
//! **No transport concerns**: HTTP pages, QR payloads and authentication of owners live in
//! the integrating application.

pub mod access;
pub mod collaborators;
pub mod config;
pub mod constants;
pub mod error;
pub mod evaluator;
pub mod policy;
pub mod profile;
pub mod repositories;
pub mod service;
pub mod validation;
pub mod visibility;
pub mod wire;

pub use access::{AccessEvent, AccessGrant, AccessLevel, AccessRequest, Credential};
pub use config::{pin_timeout_from_env_value, CoreConfig};
pub use error::{CoreError, CoreResult};
pub use evaluator::DisclosureEvaluator;
pub use policy::EmergencyView;
pub use profile::{
    Allergy, BloodType, EmergencyContact, IdentityUpdate, MedicalInfoUpdate, Profile,
};
pub use service::EmergencyAccessService;
pub use visibility::{FieldGroup, VisibilitySettings};

pub use lifetag_types::{EmailAddress, NonEmptyText};
pub use lifetag_uuid::ProfileId;
