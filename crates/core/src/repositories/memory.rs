//! In-memory collaborators for tests and embedding.
//!
//! All state sits behind `std::sync` locks so the types can be shared as `Arc<dyn _>`
//! across tasks.

use crate::access::{AccessEvent, Credential};
use crate::collaborators::{
    AccessLogSink, NotificationSink, PinVerdict, PinVerifier, ProfileStore, SinkError,
    VisibilitySettingsStore,
};
use crate::profile::Profile;
use crate::validation::validate_pin_format;
use crate::visibility::VisibilitySettings;
use crate::{CoreError, CoreResult};
use lifetag_uuid::ProfileId;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};

#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<ProfileId, Profile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn get(&self, id: &ProfileId) -> CoreResult<Profile> {
        self.profiles
            .read()
            .map_err(|_| CoreError::LockPoisoned)?
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(id.clone()))
    }

    fn put(&self, profile: Profile) -> CoreResult<()> {
        self.profiles
            .write()
            .map_err(|_| CoreError::LockPoisoned)?
            .insert(profile.id().clone(), profile);
        Ok(())
    }

    fn list(&self) -> CoreResult<Vec<ProfileId>> {
        let mut ids: Vec<ProfileId> = self
            .profiles
            .read()
            .map_err(|_| CoreError::LockPoisoned)?
            .keys()
            .cloned()
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    settings: RwLock<HashMap<ProfileId, VisibilitySettings>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VisibilitySettingsStore for InMemorySettingsStore {
    fn get(&self, profile_id: &ProfileId) -> CoreResult<VisibilitySettings> {
        Ok(self
            .settings
            .read()
            .map_err(|_| CoreError::LockPoisoned)?
            .get(profile_id)
            .cloned()
            .unwrap_or_default())
    }

    fn put(&self, profile_id: &ProfileId, settings: VisibilitySettings) -> CoreResult<()> {
        self.settings
            .write()
            .map_err(|_| CoreError::LockPoisoned)?
            .insert(profile_id.clone(), settings);
        Ok(())
    }
}

/// Verifier backed by known PINs.
///
/// A per-profile PIN wins over the shared one. A profile with neither never verifies.
#[derive(Default)]
pub struct StaticPinVerifier {
    shared: Option<String>,
    pins: RwLock<HashMap<ProfileId, String>>,
}

impl StaticPinVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A verifier that accepts `pin` for every profile.
    pub fn with_shared_pin(pin: &str) -> CoreResult<Self> {
        validate_pin_format(pin)?;
        Ok(Self {
            shared: Some(pin.to_string()),
            pins: RwLock::new(HashMap::new()),
        })
    }

    pub fn set_pin(&self, profile_id: &ProfileId, pin: &str) -> CoreResult<()> {
        validate_pin_format(pin)?;
        self.pins
            .write()
            .map_err(|_| CoreError::LockPoisoned)?
            .insert(profile_id.clone(), pin.to_string());
        Ok(())
    }
}

#[async_trait::async_trait]
impl PinVerifier for StaticPinVerifier {
    async fn verify(&self, profile_id: &ProfileId, credential: &Credential) -> PinVerdict {
        let pins = match self.pins.read() {
            Ok(pins) => pins,
            Err(_) => return PinVerdict::Timeout,
        };
        let expected = pins.get(profile_id).or(self.shared.as_ref());

        match expected {
            Some(pin) if pin == credential.expose() => PinVerdict::Valid,
            _ => PinVerdict::Invalid,
        }
    }
}

/// Access log that keeps every event in memory.
#[derive(Debug, Default)]
pub struct InMemoryAccessLog {
    events: Mutex<Vec<AccessEvent>>,
}

impl InMemoryAccessLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events, oldest first.
    pub fn events(&self) -> Vec<AccessEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AccessLogSink for InMemoryAccessLog {
    fn record(&self, event: &AccessEvent) -> Result<(), SinkError> {
        self.events
            .lock()
            .map_err(|_| SinkError::Unavailable("lock poisoned".into()))?
            .push(event.clone());
        Ok(())
    }
}

/// Notification sink that remembers what it was asked to send.
#[derive(Debug, Default)]
pub struct RecordingNotificationSink {
    sent: Mutex<Vec<(ProfileId, AccessEvent)>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<(ProfileId, AccessEvent)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn notify_owner(&self, profile_id: &ProfileId, event: &AccessEvent) -> Result<(), SinkError> {
        self.sent
            .lock()
            .map_err(|_| SinkError::Unavailable("lock poisoned".into()))?
            .push((profile_id.clone(), event.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::FieldGroup;
    use lifetag_types::NonEmptyText;

    fn profile(name: &str) -> Profile {
        Profile::new(ProfileId::new(), NonEmptyText::new(name).unwrap())
    }

    #[test]
    fn profile_store_put_get_list() {
        let store = InMemoryProfileStore::new();
        let a = profile("Alice");
        let b = profile("Bob");
        store.put(a.clone()).unwrap();
        store.put(b.clone()).unwrap();

        assert_eq!(store.get(a.id()).unwrap(), a);
        let mut expected = vec![a.id().clone(), b.id().clone()];
        expected.sort();
        assert_eq!(store.list().unwrap(), expected);
    }

    #[test]
    fn profile_store_unknown_id_is_not_found() {
        let store = InMemoryProfileStore::new();
        let id = ProfileId::new();
        assert!(matches!(store.get(&id), Err(CoreError::NotFound(missing)) if missing == id));
    }

    #[test]
    fn settings_store_defaults_when_absent() {
        let store = InMemorySettingsStore::new();
        let id = ProfileId::new();
        assert_eq!(store.get(&id).unwrap(), VisibilitySettings::default());

        let mut settings = VisibilitySettings::default();
        settings.set_visible(FieldGroup::Medications, true);
        store.put(&id, settings.clone()).unwrap();
        assert_eq!(store.get(&id).unwrap(), settings);
    }

    #[tokio::test]
    async fn static_verifier_prefers_profile_pin() {
        let verifier = StaticPinVerifier::with_shared_pin("1234").unwrap();
        let special = ProfileId::new();
        verifier.set_pin(&special, "987654").unwrap();

        let other = ProfileId::new();
        assert_eq!(
            verifier.verify(&other, &Credential::new("1234")).await,
            PinVerdict::Valid
        );
        assert_eq!(
            verifier.verify(&special, &Credential::new("1234")).await,
            PinVerdict::Invalid
        );
        assert_eq!(
            verifier.verify(&special, &Credential::new("987654")).await,
            PinVerdict::Valid
        );
    }

    #[tokio::test]
    async fn static_verifier_without_pins_rejects() {
        let verifier = StaticPinVerifier::new();
        assert_eq!(
            verifier
                .verify(&ProfileId::new(), &Credential::new("1234"))
                .await,
            PinVerdict::Invalid
        );
    }

    #[test]
    fn static_verifier_rejects_malformed_pins() {
        assert!(StaticPinVerifier::with_shared_pin("12").is_err());
        assert!(StaticPinVerifier::new()
            .set_pin(&ProfileId::new(), "abcd")
            .is_err());
    }
}
