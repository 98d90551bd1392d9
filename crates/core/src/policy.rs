//! Disclosure rules: which fields a level may see, and how a grant is applied to a profile.
//!
//! Everything here is pure. The evaluator decides *which* level a requester gets; this module
//! decides what that level reveals.

use crate::access::{AccessGrant, AccessLevel, VisibleField};
use crate::profile::{Allergy, BloodType, EmergencyContact, Profile};
use crate::visibility::{FieldGroup, VisibilitySettings};
use serde::Serialize;
use std::collections::BTreeSet;

/// Fields a public requester may see: enabled public-tier groups plus the critical alert,
/// which is never gated.
pub fn public_fields(settings: &VisibilitySettings) -> BTreeSet<VisibleField> {
    fields_for_tiers(settings, &[AccessLevel::Public])
}

/// Fields a medical requester may see: everything public plus enabled medical-tier groups.
pub fn medical_fields(settings: &VisibilitySettings) -> BTreeSet<VisibleField> {
    fields_for_tiers(settings, &[AccessLevel::Public, AccessLevel::Medical])
}

/// The grant for `level`, assuming the level has already been authorised.
pub fn grant_for(level: AccessLevel, settings: &VisibilitySettings) -> AccessGrant {
    let visible_fields = match level {
        AccessLevel::Public => public_fields(settings),
        AccessLevel::Medical => medical_fields(settings),
    };
    AccessGrant {
        level,
        visible_fields,
    }
}

fn fields_for_tiers(
    settings: &VisibilitySettings,
    tiers: &[AccessLevel],
) -> BTreeSet<VisibleField> {
    let mut fields: BTreeSet<VisibleField> = FieldGroup::ALL
        .into_iter()
        .filter(|group| tiers.contains(&group.tier()) && settings.is_visible(*group))
        .map(VisibleField::Group)
        .collect();
    fields.insert(VisibleField::CriticalAlert);
    fields
}

/// A profile as a requester is allowed to see it.
///
/// Hidden fields are absent, not empty, so the rendering does not hint at what exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyView {
    pub display_id: String,
    pub level: AccessLevel,
    /// Set when a medical request was refused and this public view is served instead.
    pub denied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<BloodType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_alert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contacts: Option<Vec<EmergencyContact>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_allergies: Option<Vec<Allergy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_conditions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medications: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Vec<Allergy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_notes: Option<String>,
}

impl EmergencyView {
    /// Expands a grant's field-groups into concrete profile fields.
    ///
    /// - `name` carries the identity bundle: name, age and gender.
    /// - `emergencyContacts` carries every contact, unredacted.
    /// - `criticalAllergiesOnly` carries only allergies flagged critical.
    /// - `allergiesFull` carries every allergy.
    pub fn render(profile: &Profile, grant: &AccessGrant) -> Self {
        let shows = |group: FieldGroup| grant.reveals(group);

        let identity = shows(FieldGroup::Name);

        Self {
            display_id: profile.display_id(),
            level: grant.level,
            denied: false,
            name: identity.then(|| profile.name.to_string()),
            age: profile.age.filter(|_| identity),
            gender: profile.gender.clone().filter(|_| identity),
            blood_type: profile.blood_type.filter(|_| shows(FieldGroup::BloodType)),
            critical_alert: profile
                .critical_alert
                .as_ref()
                .filter(|_| grant.reveals(VisibleField::CriticalAlert))
                .map(|alert| alert.to_string()),
            emergency_contacts: shows(FieldGroup::EmergencyContacts)
                .then(|| profile.emergency_contacts.clone()),
            critical_allergies: shows(FieldGroup::CriticalAllergiesOnly)
                .then(|| profile.critical_allergies().cloned().collect()),
            medical_conditions: shows(FieldGroup::MedicalConditions)
                .then(|| profile.medical_conditions.clone()),
            medications: shows(FieldGroup::Medications).then(|| profile.medications.clone()),
            allergies: shows(FieldGroup::AllergiesFull).then(|| profile.allergies.clone()),
            medical_notes: profile
                .medical_notes
                .clone()
                .filter(|_| shows(FieldGroup::MedicalNotes)),
        }
    }

    /// Public view served after a refused medical request.
    pub fn denied(profile: &Profile, public_grant: &AccessGrant) -> Self {
        Self {
            denied: true,
            ..Self::render(profile, public_grant)
        }
    }
}
