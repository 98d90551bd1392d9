//! Constants used throughout the LifeTag core crate.

use std::time::Duration;

/// Default directory for profile data when no explicit directory is configured.
pub const DEFAULT_PROFILE_DATA_DIR: &str = "profile_data";

/// Directory name for profile records under the data directory.
pub const PROFILES_DIR_NAME: &str = "profiles";

/// Filename for the stored emergency profile.
pub const PROFILE_YAML_FILENAME: &str = "profile.yaml";

/// Filename for the stored visibility settings.
pub const VISIBILITY_YAML_FILENAME: &str = "visibility.yaml";

/// Default budget for a single PIN verification.
pub const DEFAULT_PIN_VERIFICATION_TIMEOUT: Duration = Duration::from_millis(3_000);

/// Shortest accepted medical-view PIN.
pub const MIN_PIN_LEN: usize = 4;

/// Longest accepted medical-view PIN.
pub const MAX_PIN_LEN: usize = 12;
