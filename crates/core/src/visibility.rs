//! Per-profile visibility settings.
//!
//! The owner decides which field-groups each requester tier may see and how medical access is
//! controlled. Settings are a strongly typed record: every recognised option is an enum
//! variant, and the flat key/value form only exists at the storage and editing boundary.
//!
//! Resolution of an absent per-group choice follows the tier of the group:
//! - public-tier groups are visible unless switched off;
//! - medical-tier groups are hidden unless switched on.

use crate::access::AccessLevel;
use crate::{CoreError, CoreResult};
use std::collections::BTreeMap;
use std::fmt;

/// A named bundle of profile fields toggled by a single visibility flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldGroup {
    Name,
    EmergencyContacts,
    BloodType,
    CriticalAllergiesOnly,
    MedicalConditions,
    Medications,
    AllergiesFull,
    MedicalNotes,
}

impl FieldGroup {
    pub const ALL: [FieldGroup; 8] = [
        FieldGroup::Name,
        FieldGroup::EmergencyContacts,
        FieldGroup::BloodType,
        FieldGroup::CriticalAllergiesOnly,
        FieldGroup::MedicalConditions,
        FieldGroup::Medications,
        FieldGroup::AllergiesFull,
        FieldGroup::MedicalNotes,
    ];

    /// Storage/editing key for this group.
    pub fn key(self) -> &'static str {
        match self {
            FieldGroup::Name => "name",
            FieldGroup::EmergencyContacts => "emergencyContacts",
            FieldGroup::BloodType => "bloodType",
            FieldGroup::CriticalAllergiesOnly => "criticalAllergiesOnly",
            FieldGroup::MedicalConditions => "medicalConditions",
            FieldGroup::Medications => "medications",
            FieldGroup::AllergiesFull => "allergiesFull",
            FieldGroup::MedicalNotes => "medicalNotes",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.key() == key)
    }

    /// The lowest access level that may be granted this group.
    pub fn tier(self) -> AccessLevel {
        match self {
            FieldGroup::Name
            | FieldGroup::EmergencyContacts
            | FieldGroup::BloodType
            | FieldGroup::CriticalAllergiesOnly => AccessLevel::Public,
            FieldGroup::MedicalConditions
            | FieldGroup::Medications
            | FieldGroup::AllergiesFull
            | FieldGroup::MedicalNotes => AccessLevel::Medical,
        }
    }

    /// Visibility when the owner has made no explicit choice.
    pub fn default_visibility(self) -> bool {
        self.tier() == AccessLevel::Public
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Access-control and auxiliary switches that are not field-groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SettingFlag {
    RequirePinForMedicalView,
    LogAccessAttempts,
    NotifyOnAccess,
    EnableLocationServices,
    ShowNearbyHospitals,
}

impl SettingFlag {
    pub const ALL: [SettingFlag; 5] = [
        SettingFlag::RequirePinForMedicalView,
        SettingFlag::LogAccessAttempts,
        SettingFlag::NotifyOnAccess,
        SettingFlag::EnableLocationServices,
        SettingFlag::ShowNearbyHospitals,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SettingFlag::RequirePinForMedicalView => "requirePinForMedicalView",
            SettingFlag::LogAccessAttempts => "logAccessAttempts",
            SettingFlag::NotifyOnAccess => "notifyOnAccess",
            SettingFlag::EnableLocationServices => "enableLocationServices",
            SettingFlag::ShowNearbyHospitals => "showNearbyHospitals",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

/// Any recognised settings key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingKey {
    Group(FieldGroup),
    Flag(SettingFlag),
}

impl SettingKey {
    /// Parses a storage/editing key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigurationInconsistent`] for an unrecognised key.
    pub fn parse(key: &str) -> CoreResult<Self> {
        let key = key.trim();
        FieldGroup::from_key(key)
            .map(SettingKey::Group)
            .or_else(|| SettingFlag::from_key(key).map(SettingKey::Flag))
            .ok_or_else(|| {
                CoreError::ConfigurationInconsistent(format!("unknown visibility setting '{key}'"))
            })
    }
}

/// Visibility and access-control preferences for one profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibilitySettings {
    overrides: BTreeMap<FieldGroup, bool>,
    pub require_pin_for_medical_view: bool,
    pub log_access_attempts: bool,
    pub notify_on_access: bool,
    pub enable_location_services: bool,
    pub show_nearby_hospitals: bool,
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            overrides: BTreeMap::new(),
            require_pin_for_medical_view: false,
            log_access_attempts: true,
            notify_on_access: false,
            enable_location_services: false,
            show_nearby_hospitals: true,
        }
    }
}

impl VisibilitySettings {
    /// Whether `group` is switched on, applying the tier default when unset.
    pub fn is_visible(&self, group: FieldGroup) -> bool {
        self.overrides
            .get(&group)
            .copied()
            .unwrap_or_else(|| group.default_visibility())
    }

    pub fn set_visible(&mut self, group: FieldGroup, visible: bool) {
        self.overrides.insert(group, visible);
    }

    /// Forgets an explicit choice so the tier default applies again.
    pub fn clear_override(&mut self, group: FieldGroup) {
        self.overrides.remove(&group);
    }

    pub fn flag(&self, flag: SettingFlag) -> bool {
        match flag {
            SettingFlag::RequirePinForMedicalView => self.require_pin_for_medical_view,
            SettingFlag::LogAccessAttempts => self.log_access_attempts,
            SettingFlag::NotifyOnAccess => self.notify_on_access,
            SettingFlag::EnableLocationServices => self.enable_location_services,
            SettingFlag::ShowNearbyHospitals => self.show_nearby_hospitals,
        }
    }

    pub fn set_flag(&mut self, flag: SettingFlag, value: bool) {
        let slot = match flag {
            SettingFlag::RequirePinForMedicalView => &mut self.require_pin_for_medical_view,
            SettingFlag::LogAccessAttempts => &mut self.log_access_attempts,
            SettingFlag::NotifyOnAccess => &mut self.notify_on_access,
            SettingFlag::EnableLocationServices => &mut self.enable_location_services,
            SettingFlag::ShowNearbyHospitals => &mut self.show_nearby_hospitals,
        };
        *slot = value;
    }

    /// Sets one option by its storage key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigurationInconsistent`] if `key` is not recognised; nothing
    /// is changed in that case.
    pub fn apply(&mut self, key: &str, value: bool) -> CoreResult<()> {
        match SettingKey::parse(key)? {
            SettingKey::Group(group) => self.set_visible(group, value),
            SettingKey::Flag(flag) => self.set_flag(flag, value),
        }
        Ok(())
    }

    /// Builds settings from a flat key/value map, logging and skipping unknown keys.
    ///
    /// Loading never fails: an unknown key contributes nothing, so whatever it was meant to
    /// reveal stays hidden.
    pub fn from_flags<I, K>(flags: I) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: AsRef<str>,
    {
        let (settings, diagnostics) = Self::from_flags_with_diagnostics(flags);
        for diagnostic in diagnostics {
            tracing::warn!("ignoring visibility setting: {}", diagnostic);
        }
        settings
    }

    /// Like [`VisibilitySettings::from_flags`] but hands the diagnostics back instead of
    /// logging them.
    pub fn from_flags_with_diagnostics<I, K>(flags: I) -> (Self, Vec<CoreError>)
    where
        I: IntoIterator<Item = (K, bool)>,
        K: AsRef<str>,
    {
        let mut settings = Self::default();
        let mut diagnostics = Vec::new();

        for (key, value) in flags {
            if let Err(e) = settings.apply(key.as_ref(), value) {
                diagnostics.push(e);
            }
        }

        (settings, diagnostics)
    }

    /// Flat key/value form: explicit group choices plus every flag.
    pub fn to_flags(&self) -> BTreeMap<String, bool> {
        let mut flags: BTreeMap<String, bool> = self
            .overrides
            .iter()
            .map(|(group, visible)| (group.key().to_string(), *visible))
            .collect();

        for flag in SettingFlag::ALL {
            flags.insert(flag.key().to_string(), self.flag(flag));
        }

        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_tier() {
        let settings = VisibilitySettings::default();

        for group in FieldGroup::ALL {
            assert_eq!(
                settings.is_visible(group),
                group.tier() == AccessLevel::Public,
                "{group}"
            );
        }
        assert!(!settings.require_pin_for_medical_view);
        assert!(settings.log_access_attempts);
        assert!(!settings.notify_on_access);
    }

    #[test]
    fn explicit_choice_overrides_default_and_can_be_cleared() {
        let mut settings = VisibilitySettings::default();
        settings.set_visible(FieldGroup::Name, false);
        settings.set_visible(FieldGroup::Medications, true);

        assert!(!settings.is_visible(FieldGroup::Name));
        assert!(settings.is_visible(FieldGroup::Medications));

        settings.clear_override(FieldGroup::Name);
        assert!(settings.is_visible(FieldGroup::Name));
    }

    #[test]
    fn every_key_round_trips() {
        for group in FieldGroup::ALL {
            assert_eq!(SettingKey::parse(group.key()).unwrap(), SettingKey::Group(group));
        }
        for flag in SettingFlag::ALL {
            assert_eq!(SettingKey::parse(flag.key()).unwrap(), SettingKey::Flag(flag));
        }
    }

    #[test]
    fn apply_rejects_unknown_key_without_change() {
        let mut settings = VisibilitySettings::default();
        let err = settings
            .apply("showEverything", true)
            .expect_err("unknown key should fail");

        assert!(matches!(err, CoreError::ConfigurationInconsistent(msg) if msg.contains("showEverything")));
        assert_eq!(settings, VisibilitySettings::default());
    }

    #[test]
    fn from_flags_skips_unknown_keys() {
        let (settings, diagnostics) = VisibilitySettings::from_flags_with_diagnostics([
            ("medicalNotes", true),
            ("requirePinForMedicalView", true),
            ("socialSecurityNumber", true),
        ]);

        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(diagnostics[0], CoreError::ConfigurationInconsistent(_)));
        assert!(settings.is_visible(FieldGroup::MedicalNotes));
        assert!(settings.require_pin_for_medical_view);
    }

    #[test]
    fn to_flags_then_from_flags_is_identity() {
        let mut settings = VisibilitySettings::default();
        settings.set_visible(FieldGroup::BloodType, false);
        settings.set_visible(FieldGroup::AllergiesFull, true);
        settings.notify_on_access = true;

        let rebuilt = VisibilitySettings::from_flags(settings.to_flags());
        assert_eq!(rebuilt, settings);
    }
}
