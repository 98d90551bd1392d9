//! On-disk YAML forms for profiles and visibility settings.
//!
//! `profile.yaml` is parsed strictly: unknown keys and wrong types are rejected, with the
//! failing path reported. `visibility.yaml` is a flat camelCase map of booleans and is
//! tolerant of unknown keys, which are logged and ignored.
//!
//! ```yaml
//! id: 550e8400e29b41d4a716446655440000
//! name: John Doe
//! age: 42
//! bloodType: O+
//! criticalAlert: Severe peanut allergy
//! emergencyContacts:
//!   - name: Jane Doe
//!     relationship: Spouse
//!     phone: (555) 123-4567
//! allergies:
//!   - Penicillin
//!   - substance: Peanuts
//!     critical: true
//! ```

use crate::profile::{Allergy, BloodType, EmergencyContact, Profile};
use crate::validation::normalise_list_entry;
use crate::visibility::{SettingKey, VisibilitySettings};
use crate::{CoreError, CoreResult};
use lifetag_types::NonEmptyText;
use lifetag_uuid::ProfileId;
use serde::{Deserialize, Serialize};

/// `profile.yaml` operations.
pub struct ProfileFile;

impl ProfileFile {
    pub const NAME: &'static str = crate::constants::PROFILE_YAML_FILENAME;

    /// Parse a profile from YAML text.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Translation`] if the YAML does not match the schema (unknown key, wrong
    ///   type, missing required field). The message names the failing path.
    /// - [`CoreError::Uuid`] if `id` is not a canonical profile id.
    /// - [`CoreError::Text`] / [`CoreError::InvalidInput`] for blank required text, a bad
    ///   email or an unknown blood type.
    pub fn parse(yaml_text: &str) -> CoreResult<Profile> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let wire = match serde_path_to_error::deserialize::<_, ProfileWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(CoreError::Translation(format!(
                    "profile schema mismatch at {path}: {source}"
                )));
            }
        };

        wire_to_profile(wire)
    }

    /// Render a profile as YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::YamlSerialization`] if serialisation fails.
    pub fn render(profile: &Profile) -> CoreResult<String> {
        serde_yaml::to_string(&profile_to_wire(profile)).map_err(CoreError::YamlSerialization)
    }
}

/// `visibility.yaml` operations.
pub struct VisibilityFile;

impl VisibilityFile {
    pub const NAME: &'static str = crate::constants::VISIBILITY_YAML_FILENAME;

    /// Parse visibility settings. An empty document yields the defaults.
    ///
    /// Unknown keys are logged and skipped whatever their value, so a stray entry never
    /// stops the profile from being served.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Translation`] if the document is not a map, or if a recognised
    /// key has a non-boolean value.
    pub fn parse(yaml_text: &str) -> CoreResult<VisibilitySettings> {
        let (settings, diagnostics) = Self::parse_with_diagnostics(yaml_text)?;
        for diagnostic in diagnostics {
            tracing::warn!("ignoring visibility setting: {}", diagnostic);
        }
        Ok(settings)
    }

    /// Like [`VisibilityFile::parse`] but hands the skipped-key diagnostics back.
    pub fn parse_with_diagnostics(
        yaml_text: &str,
    ) -> CoreResult<(VisibilitySettings, Vec<CoreError>)> {
        if yaml_text.trim().is_empty() {
            return Ok((VisibilitySettings::default(), Vec::new()));
        }

        let document: Option<serde_yaml::Mapping> = serde_yaml::from_str(yaml_text)
            .map_err(|e| CoreError::Translation(format!("visibility settings: {e}")))?;

        let mut flags = Vec::new();
        let mut diagnostics = Vec::new();

        for (key, value) in document.unwrap_or_default() {
            let Some(key) = key.as_str() else {
                diagnostics.push(CoreError::ConfigurationInconsistent(format!(
                    "non-string visibility key {key:?}"
                )));
                continue;
            };

            if let Err(e) = SettingKey::parse(key) {
                diagnostics.push(e);
                continue;
            }

            let Some(value) = value.as_bool() else {
                return Err(CoreError::Translation(format!(
                    "visibility settings: {key} must be true or false"
                )));
            };
            flags.push((key.to_string(), value));
        }

        let (settings, more) = VisibilitySettings::from_flags_with_diagnostics(flags);
        diagnostics.extend(more);
        Ok((settings, diagnostics))
    }

    pub fn render(settings: &VisibilitySettings) -> CoreResult<String> {
        serde_yaml::to_string(&settings.to_flags()).map_err(CoreError::YamlSerialization)
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ProfileWire {
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    blood_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    critical_alert: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    emergency_contacts: Vec<ContactWire>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    medical_conditions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    medications: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    allergies: Vec<AllergyWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    medical_notes: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct ContactWire {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    relationship: Option<String>,
    phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

/// Either a bare substance name (not critical) or the detailed form.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum AllergyWire {
    Substance(String),
    Detailed(DetailedAllergyWire),
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct DetailedAllergyWire {
    substance: String,
    #[serde(default)]
    critical: bool,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn wire_to_profile(wire: ProfileWire) -> CoreResult<Profile> {
    let id = ProfileId::parse(&wire.id)?;
    let mut profile = Profile::new(id, NonEmptyText::new(&wire.name)?);

    profile.age = wire.age;
    profile.gender = blank_to_none(wire.gender);
    profile.blood_type = blank_to_none(wire.blood_type)
        .map(|b| b.parse::<BloodType>())
        .transpose()?;
    profile.critical_alert = blank_to_none(wire.critical_alert)
        .map(NonEmptyText::new)
        .transpose()?;
    profile.medical_notes = blank_to_none(wire.medical_notes);

    for contact in wire.emergency_contacts {
        profile.add_emergency_contact(EmergencyContact::new(
            &contact.name,
            &contact.phone,
            contact.relationship.as_deref(),
            contact.email.as_deref(),
        )?);
    }

    for allergy in wire.allergies {
        let allergy = match allergy {
            AllergyWire::Substance(substance) => Allergy::new(&substance, false)?,
            AllergyWire::Detailed(detail) => Allergy::new(&detail.substance, detail.critical)?,
        };
        profile.add_allergy(allergy);
    }

    profile.medical_conditions = wire
        .medical_conditions
        .iter()
        .map(|c| normalise_list_entry(c, "medical condition"))
        .collect::<CoreResult<_>>()?;
    profile.medications = wire
        .medications
        .iter()
        .map(|m| normalise_list_entry(m, "medication"))
        .collect::<CoreResult<_>>()?;

    Ok(profile)
}

fn profile_to_wire(profile: &Profile) -> ProfileWire {
    ProfileWire {
        id: profile.id().to_string(),
        name: profile.name.to_string(),
        age: profile.age,
        gender: profile.gender.clone(),
        blood_type: profile.blood_type.map(|b| b.as_str().to_string()),
        critical_alert: profile.critical_alert.as_ref().map(|a| a.to_string()),
        emergency_contacts: profile
            .emergency_contacts
            .iter()
            .map(|c| ContactWire {
                name: c.name.to_string(),
                relationship: c.relationship.as_ref().map(|r| r.to_string()),
                phone: c.phone.to_string(),
                email: c.email.as_ref().map(|e| e.to_string()),
            })
            .collect(),
        medical_conditions: profile.medical_conditions.clone(),
        medications: profile.medications.clone(),
        allergies: profile
            .allergies
            .iter()
            .map(|a| {
                AllergyWire::Detailed(DetailedAllergyWire {
                    substance: a.substance.to_string(),
                    critical: a.critical,
                })
            })
            .collect(),
        medical_notes: profile.medical_notes.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::FieldGroup;

    const SAMPLE: &str = r#"id: 550e8400e29b41d4a716446655440000
name: John Doe
age: 42
gender: Male
bloodType: O Positive
criticalAlert: Severe peanut allergy
emergencyContacts:
  - name: Jane Doe
    relationship: Spouse
    phone: (555) 123-4567
    email: jane@example.com
medicalConditions:
  - Hypertension
medications:
  - Lisinopril 10mg
allergies:
  - Penicillin
  - substance: Peanuts
    critical: true
medicalNotes: Carries an inhaler.
"#;

    #[test]
    fn parses_sample_profile() {
        let profile = ProfileFile::parse(SAMPLE).expect("parse sample");

        assert_eq!(profile.id().to_string(), "550e8400e29b41d4a716446655440000");
        assert_eq!(profile.name.as_str(), "John Doe");
        assert_eq!(profile.age, Some(42));
        assert_eq!(profile.blood_type, Some(BloodType::OPositive));
        assert_eq!(profile.emergency_contacts.len(), 1);
        assert_eq!(
            profile.emergency_contacts[0]
                .relationship
                .as_ref()
                .map(|r| r.as_str()),
            Some("Spouse")
        );
        assert_eq!(profile.allergies.len(), 2);
        assert!(!profile.allergies[0].critical);
        assert!(profile.allergies[1].critical);
    }

    #[test]
    fn render_then_parse_preserves_profile() {
        let profile = ProfileFile::parse(SAMPLE).expect("parse sample");
        let output = ProfileFile::render(&profile).expect("render");
        let reparsed = ProfileFile::parse(&output).expect("reparse");

        assert_eq!(profile, reparsed);
        assert!(output.contains("bloodType: O+"));
    }

    #[test]
    fn rejects_unknown_keys_with_path() {
        let input = format!("{SAMPLE}socialSecurityNumber: 123-45-6789\n");
        let err = ProfileFile::parse(&input).expect_err("unknown key");

        match err {
            CoreError::Translation(msg) => assert!(msg.contains("socialSecurityNumber")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_wrong_types_with_path() {
        let input = r#"id: 550e8400e29b41d4a716446655440000
name: John Doe
age: forty-two
"#;
        let err = ProfileFile::parse(input).expect_err("wrong type");

        match err {
            CoreError::Translation(msg) => assert!(msg.contains("age")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_canonical_id() {
        let input = "id: 550e8400-e29b-41d4-a716-446655440000\nname: John Doe\n";
        let err = ProfileFile::parse(input).expect_err("hyphenated id");
        assert!(matches!(err, CoreError::Uuid(_)));
    }

    #[test]
    fn rejects_blank_name_and_unknown_blood_type() {
        let blank = "id: 550e8400e29b41d4a716446655440000\nname: '  '\n";
        assert!(matches!(
            ProfileFile::parse(blank).expect_err("blank name"),
            CoreError::Text(_)
        ));

        let blood = "id: 550e8400e29b41d4a716446655440000\nname: John\nbloodType: Z+\n";
        assert!(matches!(
            ProfileFile::parse(blood).expect_err("bad blood type"),
            CoreError::InvalidInput(_)
        ));
    }

    #[test]
    fn visibility_file_tolerates_unknown_keys() {
        let input = "medications: true\nrequirePinForMedicalView: true\nshowEverything: true\n";
        let settings = VisibilityFile::parse(input).expect("parse visibility");

        assert!(settings.is_visible(FieldGroup::Medications));
        assert!(settings.require_pin_for_medical_view);
        assert!(!settings.is_visible(FieldGroup::MedicalNotes));
    }

    #[test]
    fn visibility_file_skips_unknown_keys_of_any_type() {
        let input = "name: false\nlegacyTheme: dark\nfoo:\n42: true\nmedicalNotes: true\n";
        let (settings, diagnostics) =
            VisibilityFile::parse_with_diagnostics(input).expect("stray keys must not fail");

        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics
            .iter()
            .all(|d| matches!(d, CoreError::ConfigurationInconsistent(_))));
        assert!(!settings.is_visible(FieldGroup::Name));
        assert!(settings.is_visible(FieldGroup::MedicalNotes));
    }

    #[test]
    fn visibility_file_empty_is_default() {
        assert_eq!(
            VisibilityFile::parse("").unwrap(),
            VisibilitySettings::default()
        );
    }

    #[test]
    fn visibility_file_rejects_non_boolean_values() {
        let err = VisibilityFile::parse("medications: sometimes\n").expect_err("not a bool");
        assert!(matches!(err, CoreError::Translation(_)));
    }

    #[test]
    fn visibility_file_round_trips() {
        let mut settings = VisibilitySettings::default();
        settings.set_visible(FieldGroup::Name, false);
        settings.notify_on_access = true;

        let text = VisibilityFile::render(&settings).unwrap();
        assert_eq!(VisibilityFile::parse(&text).unwrap(), settings);
    }
}
