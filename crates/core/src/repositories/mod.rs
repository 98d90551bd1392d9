//! Stock implementations of the collaborator traits.
//!
//! - [`memory`]: in-process stores, verifier and sinks, mainly for tests and embedding.
//! - [`file`]: sharded YAML storage under the configured profile data directory.
//! - [`sinks`]: `tracing`-backed access log and channel-backed owner notifications.

pub mod file;
pub mod memory;
pub mod sinks;
