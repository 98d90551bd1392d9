//! Emergency access service.
//!
//! Wires the profile and settings stores to the [`DisclosureEvaluator`] and offers the
//! owner-facing maintenance operations. Request handling reads from the stores and never
//! writes to them.

use crate::access::{AccessGrant, AccessLevel, AccessRequest};
use crate::collaborators::{ProfileStore, VisibilitySettingsStore};
use crate::evaluator::DisclosureEvaluator;
use crate::policy::{self, EmergencyView};
use crate::profile::{EmergencyContact, IdentityUpdate, MedicalInfoUpdate, Profile};
use crate::visibility::VisibilitySettings;
use crate::{CoreError, CoreResult};
use lifetag_uuid::ProfileId;
use std::sync::Arc;

#[derive(Clone)]
pub struct EmergencyAccessService {
    profiles: Arc<dyn ProfileStore>,
    settings: Arc<dyn VisibilitySettingsStore>,
    evaluator: DisclosureEvaluator,
}

impl EmergencyAccessService {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        settings: Arc<dyn VisibilitySettingsStore>,
        evaluator: DisclosureEvaluator,
    ) -> Self {
        Self {
            profiles,
            settings,
            evaluator,
        }
    }

    /// Evaluates `request` against the stored profile and settings.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] for an unknown id, the evaluator's authentication errors, and
    /// storage errors.
    pub async fn grant(&self, id: &ProfileId, request: &AccessRequest) -> CoreResult<AccessGrant> {
        let profile = self.profiles.get(id)?;
        let settings = self.settings.get(id)?;
        self.evaluator.evaluate(&profile, &settings, request).await
    }

    /// Renders what `request` may see.
    ///
    /// A refused medical request yields the public view flagged as denied, so the emergency
    /// page stays usable after a wrong PIN. Other errors propagate.
    pub async fn view(&self, id: &ProfileId, request: &AccessRequest) -> CoreResult<EmergencyView> {
        let profile = self.profiles.get(id)?;
        let settings = self.settings.get(id)?;

        match self.evaluator.evaluate(&profile, &settings, request).await {
            Ok(grant) => Ok(EmergencyView::render(&profile, &grant)),
            Err(e) if e.is_denial() => {
                let public = policy::grant_for(AccessLevel::Public, &settings);
                Ok(EmergencyView::denied(&profile, &public))
            }
            Err(e) => Err(e),
        }
    }

    /// Stores a new profile.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if a profile with the same id already exists.
    pub fn register_profile(&self, profile: Profile) -> CoreResult<ProfileId> {
        match self.profiles.get(profile.id()) {
            Ok(_) => {
                return Err(CoreError::InvalidInput(format!(
                    "profile {} already exists",
                    profile.id()
                )))
            }
            Err(CoreError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let id = profile.id().clone();
        self.profiles.put(profile)?;
        tracing::debug!(profile = %id, "profile registered");
        Ok(id)
    }

    pub fn list_profiles(&self) -> CoreResult<Vec<Profile>> {
        self.profiles
            .list()?
            .iter()
            .map(|id| self.profiles.get(id))
            .collect()
    }

    pub fn visibility(&self, id: &ProfileId) -> CoreResult<VisibilitySettings> {
        self.profiles.get(id)?;
        self.settings.get(id)
    }

    /// Replaces the visibility settings of an existing profile.
    pub fn update_visibility(&self, id: &ProfileId, settings: VisibilitySettings) -> CoreResult<()> {
        self.profiles.get(id)?;
        self.settings.put(id, settings)
    }

    /// Sets one visibility option by its storage key.
    ///
    /// # Errors
    ///
    /// [`CoreError::ConfigurationInconsistent`] for an unknown key; the stored settings are
    /// left untouched.
    pub fn set_visibility_key(&self, id: &ProfileId, key: &str, value: bool) -> CoreResult<()> {
        let mut settings = self.visibility(id)?;
        settings.apply(key, value)?;
        self.settings.put(id, settings)
    }

    /// Loads a profile, applies `edit` and stores the result.
    ///
    /// Nothing is written if `edit` fails.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] for an unknown id, whatever `edit` returns, and
    /// [`CoreError::InvalidInput`] if the edited profile carries a different id.
    pub fn update_profile<F>(&self, id: &ProfileId, edit: F) -> CoreResult<Profile>
    where
        F: FnOnce(&mut Profile) -> CoreResult<()>,
    {
        let mut profile = self.profiles.get(id)?;
        edit(&mut profile)?;

        if profile.id() != id {
            return Err(CoreError::InvalidInput(format!(
                "profile id is immutable: {} cannot become {}",
                id,
                profile.id()
            )));
        }

        self.profiles.put(profile.clone())?;
        tracing::debug!(profile = %id, "profile updated");
        Ok(profile)
    }

    pub fn update_identity(&self, id: &ProfileId, update: &IdentityUpdate) -> CoreResult<Profile> {
        self.update_profile(id, |profile| update.apply(profile))
    }

    pub fn update_medical_info(
        &self,
        id: &ProfileId,
        update: &MedicalInfoUpdate,
    ) -> CoreResult<Profile> {
        self.update_profile(id, |profile| update.apply(profile))
    }

    pub fn add_emergency_contact(&self, id: &ProfileId, contact: EmergencyContact) -> CoreResult<()> {
        self.update_profile(id, |profile| {
            profile.add_emergency_contact(contact);
            Ok(())
        })?;
        Ok(())
    }

    /// Removes the contact at `index` (zero-based, in stored order).
    pub fn remove_emergency_contact(
        &self,
        id: &ProfileId,
        index: usize,
    ) -> CoreResult<EmergencyContact> {
        let mut removed = None;
        self.update_profile(id, |profile| {
            removed = profile.remove_emergency_contact(index);
            removed.as_ref().map(|_| ()).ok_or_else(|| missing_contact(index))
        })?;
        removed.ok_or_else(|| missing_contact(index))
    }
}

fn missing_contact(index: usize) -> CoreError {
    CoreError::InvalidInput(format!("no emergency contact at position {}", index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Credential;
    use crate::config::CoreConfig;
    use crate::repositories::memory::{
        InMemoryAccessLog, InMemoryProfileStore, InMemorySettingsStore,
        RecordingNotificationSink, StaticPinVerifier,
    };
    use crate::visibility::FieldGroup;
    use lifetag_types::NonEmptyText;
    use std::path::PathBuf;
    use std::time::Duration;

    fn service() -> EmergencyAccessService {
        let cfg = CoreConfig::new(PathBuf::from("unused"), Duration::from_secs(1)).unwrap();
        let evaluator = DisclosureEvaluator::new(
            &cfg,
            Arc::new(StaticPinVerifier::with_shared_pin("1234").unwrap()),
            Arc::new(InMemoryAccessLog::new()),
            Arc::new(RecordingNotificationSink::new()),
        );
        EmergencyAccessService::new(
            Arc::new(InMemoryProfileStore::new()),
            Arc::new(InMemorySettingsStore::new()),
            evaluator,
        )
    }

    fn profile() -> Profile {
        let mut profile = Profile::new(ProfileId::new(), NonEmptyText::new("John Doe").unwrap());
        profile.add_medication("Metformin").unwrap();
        profile
    }

    #[tokio::test]
    async fn unknown_profile_is_not_found() {
        let service = service();
        let err = service
            .view(&ProfileId::new(), &AccessRequest::public())
            .await
            .expect_err("unknown id");
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn wrong_pin_serves_denied_public_view() {
        let service = service();
        let id = service.register_profile(profile()).unwrap();
        service
            .set_visibility_key(&id, "requirePinForMedicalView", true)
            .unwrap();
        service.set_visibility_key(&id, "medications", true).unwrap();

        let view = service
            .view(&id, &AccessRequest::medical(Some(Credential::new("0000"))))
            .await
            .expect("denial renders a public view");
        assert!(view.denied);
        assert_eq!(view.level, AccessLevel::Public);
        assert!(view.medications.is_none());

        let view = service
            .view(&id, &AccessRequest::medical(Some(Credential::new("1234"))))
            .await
            .unwrap();
        assert!(!view.denied);
        assert_eq!(view.medications, Some(vec!["Metformin".to_string()]));
    }

    #[tokio::test]
    async fn grant_surfaces_authentication_errors() {
        let service = service();
        let id = service.register_profile(profile()).unwrap();
        service
            .set_visibility_key(&id, "requirePinForMedicalView", true)
            .unwrap();

        let err = service
            .grant(&id, &AccessRequest::medical(None))
            .await
            .expect_err("no credential");
        assert!(matches!(err, CoreError::AuthenticationRequired));
    }

    #[test]
    fn register_rejects_duplicates() {
        let service = service();
        let profile = profile();
        service.register_profile(profile.clone()).unwrap();
        assert!(matches!(
            service.register_profile(profile),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn set_visibility_key_rejects_unknown_key() {
        let service = service();
        let id = service.register_profile(profile()).unwrap();

        let err = service
            .set_visibility_key(&id, "everything", true)
            .expect_err("unknown key");
        assert!(matches!(err, CoreError::ConfigurationInconsistent(_)));
        assert_eq!(service.visibility(&id).unwrap(), VisibilitySettings::default());
    }

    #[test]
    fn update_visibility_requires_existing_profile() {
        let service = service();
        let err = service
            .update_visibility(&ProfileId::new(), VisibilitySettings::default())
            .expect_err("unknown id");
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn add_emergency_contact_persists() {
        let service = service();
        let id = service.register_profile(profile()).unwrap();
        let contact = EmergencyContact::new("Jane Doe", "555-0100", Some("Spouse"), None).unwrap();

        service.add_emergency_contact(&id, contact.clone()).unwrap();

        let stored = service.list_profiles().unwrap();
        assert_eq!(stored[0].emergency_contacts, vec![contact]);
        assert!(service
            .visibility(&id)
            .unwrap()
            .is_visible(FieldGroup::EmergencyContacts));
    }

    #[test]
    fn update_medical_info_persists_and_is_disclosed() {
        let service = service();
        let id = service.register_profile(profile()).unwrap();

        let update = MedicalInfoUpdate {
            critical_alert: Some("Insulin dependent".into()),
            add_medications: vec!["Insulin glargine".into()],
            remove_medications: vec!["Metformin".into()],
            ..Default::default()
        };
        let updated = service.update_medical_info(&id, &update).unwrap();
        assert_eq!(updated.medications, ["Insulin glargine"]);

        let stored = service.list_profiles().unwrap();
        assert_eq!(stored[0], updated);
        assert_eq!(
            stored[0].critical_alert.as_ref().map(|a| a.as_str()),
            Some("Insulin dependent")
        );
    }

    #[test]
    fn update_identity_rejects_blank_name_without_writing() {
        let service = service();
        let original = profile();
        let id = service.register_profile(original.clone()).unwrap();

        let update = IdentityUpdate {
            name: Some(" ".into()),
            ..Default::default()
        };
        assert!(service.update_identity(&id, &update).is_err());
        assert_eq!(service.list_profiles().unwrap(), vec![original]);

        let update = IdentityUpdate {
            age: Some(61),
            gender: Some("Male".into()),
            ..Default::default()
        };
        let updated = service.update_identity(&id, &update).unwrap();
        assert_eq!(updated.age, Some(61));
        assert_eq!(updated.name.as_str(), "John Doe");
    }

    #[test]
    fn update_profile_keeps_id_immutable() {
        let service = service();
        let original = profile();
        let id = service.register_profile(original.clone()).unwrap();

        let err = service
            .update_profile(&id, |profile| {
                *profile = Profile::new(ProfileId::new(), profile.name.clone());
                Ok(())
            })
            .expect_err("id change");
        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert_eq!(service.list_profiles().unwrap(), vec![original]);
    }

    #[test]
    fn update_profile_unknown_id_is_not_found() {
        let service = service();
        let err = service
            .update_identity(&ProfileId::new(), &IdentityUpdate::default())
            .expect_err("unknown id");
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn remove_emergency_contact_by_position() {
        let service = service();
        let id = service.register_profile(profile()).unwrap();
        for name in ["Jane Doe", "Jim Doe"] {
            let contact = EmergencyContact::new(name, "555-0100", None, None).unwrap();
            service.add_emergency_contact(&id, contact).unwrap();
        }

        let removed = service.remove_emergency_contact(&id, 0).unwrap();
        assert_eq!(removed.name.as_str(), "Jane Doe");
        assert!(matches!(
            service.remove_emergency_contact(&id, 1),
            Err(CoreError::InvalidInput(_))
        ));

        let stored = service.list_profiles().unwrap();
        assert_eq!(stored[0].emergency_contacts.len(), 1);
        assert_eq!(stored[0].emergency_contacts[0].name.as_str(), "Jim Doe");
    }
}
