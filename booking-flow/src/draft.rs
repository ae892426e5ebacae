use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    catalog::{Catalog, Service},
    error::{BookingError, Result},
    step::Step,
};

pub const MAX_PAIN_INTENSITY: u8 = 10;
const DEFAULT_PAIN_INTENSITY: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Female,
    Male,
    Diverse,
    PreferNotToSay,
}

/// The in-progress booking held by one wizard session.
///
/// Text fields use the empty string for "not filled in". `step` is only
/// moved by the wizard itself; [`FieldUpdate`] has no way to reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub step: Step,
    pub selected_service: Option<Service>,
    pub selected_date: Option<NaiveDate>,
    pub selected_slot: Option<String>,

    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub is_first_session: Option<bool>,
    pub age: String,
    pub gender: Option<Gender>,

    pub concern: String,
    pub pain_area: String,
    pub pain_intensity: u8,
    pub injuries: String,
    pub notes: String,
    pub consent: bool,
}

impl Default for BookingDraft {
    fn default() -> Self {
        Self {
            step: Step::ServiceAndTime,
            selected_service: None,
            selected_date: None,
            selected_slot: None,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            is_first_session: None,
            age: String::new(),
            gender: None,
            concern: String::new(),
            pain_area: String::new(),
            pain_intensity: DEFAULT_PAIN_INTENSITY,
            injuries: String::new(),
            notes: String::new(),
            consent: false,
        }
    }
}

impl BookingDraft {
    /// Apply a single form edit.
    ///
    /// Choosing a different date clears the chosen time, since the slot
    /// belongs to the previous day. An empty slot label clears the time too.
    pub fn apply(&mut self, update: FieldUpdate, catalog: &Catalog) -> Result<()> {
        match update {
            FieldUpdate::SelectedService(id) => {
                self.selected_service = match id {
                    Some(id) => Some(
                        catalog
                            .find(&id)
                            .cloned()
                            .ok_or(BookingError::UnknownService(id))?,
                    ),
                    None => None,
                };
            }
            FieldUpdate::SelectedDate(date) => {
                if self.selected_date != date {
                    self.selected_slot = None;
                }
                self.selected_date = date;
            }
            FieldUpdate::SelectedSlot(slot) => {
                self.selected_slot = slot.filter(|slot| !slot.is_empty());
            }
            FieldUpdate::FirstName(value) => self.first_name = value,
            FieldUpdate::LastName(value) => self.last_name = value,
            FieldUpdate::Email(value) => self.email = value,
            FieldUpdate::Phone(value) => self.phone = value,
            FieldUpdate::IsFirstSession(value) => self.is_first_session = value,
            FieldUpdate::Age(value) => self.age = value,
            FieldUpdate::Gender(value) => self.gender = value,
            FieldUpdate::Concern(value) => self.concern = value,
            FieldUpdate::PainArea(value) => self.pain_area = value,
            FieldUpdate::PainIntensity(value) => {
                if value > MAX_PAIN_INTENSITY {
                    return Err(BookingError::InvalidFieldValue {
                        field: "painIntensity".to_string(),
                        reason: format!("must be between 0 and {}", MAX_PAIN_INTENSITY),
                    });
                }
                self.pain_intensity = value;
            }
            FieldUpdate::Injuries(value) => self.injuries = value,
            FieldUpdate::Notes(value) => self.notes = value,
            FieldUpdate::Consent(value) => self.consent = value,
        }
        Ok(())
    }
}

/// A single edit coming from a form control.
///
/// Serialized as `{"field": "firstName", "value": "Anna"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FieldUpdate {
    /// Service id from the catalog
    SelectedService(Option<String>),
    SelectedDate(Option<NaiveDate>),
    SelectedSlot(Option<String>),
    FirstName(String),
    LastName(String),
    Email(String),
    Phone(String),
    IsFirstSession(Option<bool>),
    Age(String),
    Gender(Option<Gender>),
    Concern(String),
    PainArea(String),
    PainIntensity(u8),
    Injuries(String),
    Notes(String),
    Consent(bool),
}

const FIELD_NAMES: &[&str] = &[
    "selectedService",
    "selectedDate",
    "selectedSlot",
    "firstName",
    "lastName",
    "email",
    "phone",
    "isFirstSession",
    "age",
    "gender",
    "concern",
    "painArea",
    "painIntensity",
    "injuries",
    "notes",
    "consent",
];

impl FieldUpdate {
    /// Build an update from a field name and a loosely typed value.
    pub fn parse(name: &str, value: Value) -> Result<Self> {
        if name == "step" {
            return Err(BookingError::ReadOnlyField(name.to_string()));
        }
        if !FIELD_NAMES.contains(&name) {
            return Err(BookingError::UnknownField(name.to_string()));
        }

        // The gender select uses "" for "nothing chosen"
        let value = match (name, value) {
            ("gender", Value::String(s)) if s.is_empty() => Value::Null,
            (_, value) => value,
        };

        serde_json::from_value(json!({ "field": name, "value": value })).map_err(|e| {
            BookingError::InvalidFieldValue {
                field: name.to_string(),
                reason: e.to_string(),
            }
        })
    }
}
