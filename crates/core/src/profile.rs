//! Emergency profile data model.
//!
//! A [`Profile`] is one subject's emergency record. It is read-only from the evaluator's point
//! of view; only the owner-facing maintenance operations in this module mutate it.

use crate::validation::normalise_list_entry;
use crate::{CoreError, CoreResult};
use lifetag_types::{EmailAddress, NonEmptyText};
use lifetag_uuid::ProfileId;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// ABO/Rh blood group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BloodType {
    APositive,
    ANegative,
    BPositive,
    BNegative,
    AbPositive,
    AbNegative,
    OPositive,
    ONegative,
}

impl BloodType {
    /// Short clinical notation, e.g. `AB-`.
    pub fn as_str(self) -> &'static str {
        match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodType {
    type Err = CoreError;

    /// Accepts `O+`, `O Positive`, `o positive`, `AB Negative`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .split_whitespace()
            .collect::<String>()
            .to_ascii_uppercase();

        let (group, rh) = if let Some(group) = compact.strip_suffix("POSITIVE") {
            (group, '+')
        } else if let Some(group) = compact.strip_suffix("NEGATIVE") {
            (group, '-')
        } else if let Some(group) = compact.strip_suffix('+') {
            (group, '+')
        } else if let Some(group) = compact.strip_suffix('-') {
            (group, '-')
        } else {
            return Err(CoreError::InvalidInput(format!("unknown blood type '{}'", s)));
        };

        match (group, rh) {
            ("A", '+') => Ok(BloodType::APositive),
            ("A", '-') => Ok(BloodType::ANegative),
            ("B", '+') => Ok(BloodType::BPositive),
            ("B", '-') => Ok(BloodType::BNegative),
            ("AB", '+') => Ok(BloodType::AbPositive),
            ("AB", '-') => Ok(BloodType::AbNegative),
            ("O", '+') => Ok(BloodType::OPositive),
            ("O", '-') => Ok(BloodType::ONegative),
            _ => Err(CoreError::InvalidInput(format!("unknown blood type '{}'", s))),
        }
    }
}

impl Serialize for BloodType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Someone to call on the subject's behalf.
///
/// Contacts are disclosed whole or not at all; there is no per-field redaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmergencyContact {
    pub name: NonEmptyText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<NonEmptyText>,
    pub phone: NonEmptyText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailAddress>,
}

impl EmergencyContact {
    /// Builds a contact from raw form input. Name and phone are required.
    pub fn new(
        name: &str,
        phone: &str,
        relationship: Option<&str>,
        email: Option<&str>,
    ) -> CoreResult<Self> {
        let relationship = relationship
            .filter(|r| !r.trim().is_empty())
            .map(NonEmptyText::new)
            .transpose()?;
        let email = email
            .filter(|e| !e.trim().is_empty())
            .map(EmailAddress::parse)
            .transpose()?;

        Ok(Self {
            name: NonEmptyText::new(name)?,
            relationship,
            phone: NonEmptyText::new(phone)?,
            email,
        })
    }
}

/// A recorded allergy.
///
/// `critical` marks life-threatening allergies; only those are eligible for the public
/// "critical allergies" group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Allergy {
    pub substance: NonEmptyText,
    pub critical: bool,
}

impl Allergy {
    pub fn new(substance: &str, critical: bool) -> CoreResult<Self> {
        Ok(Self {
            substance: NonEmptyText::new(substance)?,
            critical,
        })
    }
}

/// One subject's emergency record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    id: ProfileId,
    pub name: NonEmptyText,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub blood_type: Option<BloodType>,
    pub critical_alert: Option<NonEmptyText>,
    pub emergency_contacts: Vec<EmergencyContact>,
    pub medical_conditions: Vec<String>,
    pub medications: Vec<String>,
    pub allergies: Vec<Allergy>,
    pub medical_notes: Option<String>,
}

impl Profile {
    /// Creates an empty profile for `name` under an already-allocated id.
    pub fn new(id: ProfileId, name: NonEmptyText) -> Self {
        Self {
            id,
            name,
            age: None,
            gender: None,
            blood_type: None,
            critical_alert: None,
            emergency_contacts: Vec::new(),
            medical_conditions: Vec::new(),
            medications: Vec::new(),
            allergies: Vec::new(),
            medical_notes: None,
        }
    }

    /// The profile's identifier. Immutable once assigned.
    pub fn id(&self) -> &ProfileId {
        &self.id
    }

    /// Human-facing tag identifier, e.g. `LT-550e8400`.
    pub fn display_id(&self) -> String {
        self.id.display_id()
    }

    /// Allergies flagged life-threatening.
    pub fn critical_allergies(&self) -> impl Iterator<Item = &Allergy> {
        self.allergies.iter().filter(|a| a.critical)
    }

    pub fn add_emergency_contact(&mut self, contact: EmergencyContact) {
        self.emergency_contacts.push(contact);
    }

    /// Removes the contact at `index`, keeping the order of the rest.
    pub fn remove_emergency_contact(&mut self, index: usize) -> Option<EmergencyContact> {
        (index < self.emergency_contacts.len()).then(|| self.emergency_contacts.remove(index))
    }

    pub fn add_allergy(&mut self, allergy: Allergy) {
        self.allergies.push(allergy);
    }

    pub fn remove_allergy(&mut self, substance: &str) -> bool {
        let before = self.allergies.len();
        self.allergies
            .retain(|a| a.substance.as_str() != substance.trim());
        self.allergies.len() != before
    }

    pub fn add_medication(&mut self, medication: &str) -> CoreResult<()> {
        self.medications
            .push(normalise_list_entry(medication, "medication")?);
        Ok(())
    }

    pub fn remove_medication(&mut self, medication: &str) -> bool {
        remove_entry(&mut self.medications, medication)
    }

    pub fn add_medical_condition(&mut self, condition: &str) -> CoreResult<()> {
        self.medical_conditions
            .push(normalise_list_entry(condition, "medical condition")?);
        Ok(())
    }

    pub fn remove_medical_condition(&mut self, condition: &str) -> bool {
        remove_entry(&mut self.medical_conditions, condition)
    }
}

/// Owner edit of the identity fields. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    /// A blank value clears the field.
    pub gender: Option<String>,
}

impl IdentityUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.gender.is_none()
    }

    /// Applies the edit; on error `profile` is left untouched.
    pub fn apply(&self, profile: &mut Profile) -> CoreResult<()> {
        let name = self.name.as_deref().map(NonEmptyText::new).transpose()?;

        if let Some(name) = name {
            profile.name = name;
        }
        if let Some(age) = self.age {
            profile.age = Some(age);
        }
        if let Some(gender) = &self.gender {
            profile.gender = blank_to_none(gender).map(str::to_string);
        }
        Ok(())
    }
}

/// Owner edit of the medical fields.
///
/// Scalar fields follow the [`IdentityUpdate`] convention: `None` keeps the stored value and
/// a blank string clears it. List removals run before additions, so one update can replace
/// an entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MedicalInfoUpdate {
    pub blood_type: Option<String>,
    pub critical_alert: Option<String>,
    pub medical_notes: Option<String>,
    pub add_allergies: Vec<Allergy>,
    pub remove_allergies: Vec<String>,
    pub add_medications: Vec<String>,
    pub remove_medications: Vec<String>,
    pub add_conditions: Vec<String>,
    pub remove_conditions: Vec<String>,
}

impl MedicalInfoUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the edit; on error `profile` is left untouched.
    pub fn apply(&self, profile: &mut Profile) -> CoreResult<()> {
        let mut edited = profile.clone();

        if let Some(blood_type) = &self.blood_type {
            edited.blood_type = blank_to_none(blood_type)
                .map(str::parse::<BloodType>)
                .transpose()?;
        }
        if let Some(alert) = &self.critical_alert {
            edited.critical_alert = blank_to_none(alert).map(NonEmptyText::new).transpose()?;
        }
        if let Some(notes) = &self.medical_notes {
            edited.medical_notes = blank_to_none(notes).map(str::to_string);
        }

        for substance in &self.remove_allergies {
            edited.remove_allergy(substance);
        }
        for medication in &self.remove_medications {
            edited.remove_medication(medication);
        }
        for condition in &self.remove_conditions {
            edited.remove_medical_condition(condition);
        }

        for allergy in &self.add_allergies {
            edited.add_allergy(allergy.clone());
        }
        for medication in &self.add_medications {
            edited.add_medication(medication)?;
        }
        for condition in &self.add_conditions {
            edited.add_medical_condition(condition)?;
        }

        *profile = edited;
        Ok(())
    }
}

fn blank_to_none(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn remove_entry(list: &mut Vec<String>, entry: &str) -> bool {
    let before = list.len();
    list.retain(|e| e != entry.trim());
    list.len() != before
}
