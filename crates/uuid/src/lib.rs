//! Profile identifiers and sharded-path utilities.
//!
//! Every emergency profile is addressed by a [`ProfileId`]: an opaque, stable identifier that is
//! assigned once when the profile is registered and never changes afterwards. The scannable tag
//! encodes this identifier, so it must stay valid for the lifetime of the tag.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Externally supplied identifiers (CLI arguments, scanned payloads) must already be canonical.
//! Use [`ProfileId::parse`]; uppercase, hyphenated or truncated values are rejected rather than
//! normalised.
//!
//! ## Sharded directory layout
//! For a canonical id `u`, file-backed stores keep data under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`

mod profile_id;

pub use profile_id::ProfileId;

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
