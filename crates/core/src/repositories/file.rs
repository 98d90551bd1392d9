//! Filesystem-backed profile and settings store.
//!
//! ## Storage Layout
//!
//! ```text
//! profiles/
//!   <s1>/
//!     <s2>/
//!       <id>/
//!         profile.yaml      # emergency profile
//!         visibility.yaml   # owner's visibility settings (optional)
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the profile id.

use crate::collaborators::{ProfileStore, VisibilitySettingsStore};
use crate::config::CoreConfig;
use crate::profile::Profile;
use crate::visibility::VisibilitySettings;
use crate::wire::{ProfileFile, VisibilityFile};
use crate::{CoreError, CoreResult};
use lifetag_uuid::ProfileId;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Profile and visibility store rooted at `<profile_data_dir>/profiles`.
#[derive(Clone, Debug)]
pub struct FileProfileStore {
    cfg: Arc<CoreConfig>,
}

impl FileProfileStore {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    fn profile_dir(&self, id: &ProfileId) -> PathBuf {
        id.sharded_dir(&self.cfg.profiles_dir())
    }

    fn ensure_profile_dir(&self, id: &ProfileId) -> CoreResult<PathBuf> {
        let dir = self.profile_dir(id);
        fs::create_dir_all(&dir).map_err(CoreError::StorageDirCreation)?;
        Ok(dir)
    }
}

impl ProfileStore for FileProfileStore {
    fn get(&self, id: &ProfileId) -> CoreResult<Profile> {
        let path = self.profile_dir(id).join(ProfileFile::NAME);
        if !path.is_file() {
            return Err(CoreError::NotFound(id.clone()));
        }

        let profile = read_profile(&path)?;
        if profile.id() != id {
            return Err(CoreError::InvalidInput(format!(
                "{} holds profile {}, expected {}",
                path.display(),
                profile.id(),
                id
            )));
        }
        Ok(profile)
    }

    fn put(&self, profile: Profile) -> CoreResult<()> {
        let dir = self.ensure_profile_dir(profile.id())?;
        let yaml = ProfileFile::render(&profile)?;
        fs::write(dir.join(ProfileFile::NAME), yaml).map_err(CoreError::FileWrite)
    }

    /// Ids of all readable profiles, sorted.
    ///
    /// Entries that are not canonical ids or whose `profile.yaml` cannot be parsed are logged
    /// as warnings and skipped.
    fn list(&self) -> CoreResult<Vec<ProfileId>> {
        let mut ids = Vec::new();

        let s1_iter = match fs::read_dir(self.cfg.profiles_dir()) {
            Ok(it) => it,
            Err(_) => return Ok(ids),
        };

        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let id_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };

                for id_ent in id_iter.flatten() {
                    let id_path = id_ent.path();
                    let profile_path = id_path.join(ProfileFile::NAME);
                    if !profile_path.is_file() {
                        continue;
                    }

                    match read_profile(&profile_path) {
                        Ok(profile) if self.profile_dir(profile.id()) == id_path => {
                            ids.push(profile.id().clone());
                        }
                        Ok(profile) => {
                            tracing::warn!(
                                "profile {} stored under unexpected path: {}",
                                profile.id(),
                                id_path.display()
                            );
                        }
                        Err(e) => {
                            tracing::warn!(
                                "failed to read profile.yaml: {} - {}",
                                profile_path.display(),
                                e
                            );
                        }
                    }
                }
            }
        }

        ids.sort();
        Ok(ids)
    }
}

impl VisibilitySettingsStore for FileProfileStore {
    fn get(&self, profile_id: &ProfileId) -> CoreResult<VisibilitySettings> {
        let path = self.profile_dir(profile_id).join(VisibilityFile::NAME);
        if !path.is_file() {
            return Ok(VisibilitySettings::default());
        }

        let contents = fs::read_to_string(&path).map_err(CoreError::FileRead)?;
        VisibilityFile::parse(&contents)
    }

    fn put(&self, profile_id: &ProfileId, settings: VisibilitySettings) -> CoreResult<()> {
        let dir = self.ensure_profile_dir(profile_id)?;
        let yaml = VisibilityFile::render(&settings)?;
        fs::write(dir.join(VisibilityFile::NAME), yaml).map_err(CoreError::FileWrite)
    }
}

fn read_profile(path: &Path) -> CoreResult<Profile> {
    let contents = fs::read_to_string(path).map_err(CoreError::FileRead)?;
    ProfileFile::parse(&contents)
}
