use std::fmt;

use serde::{Deserialize, Serialize};

use crate::draft::BookingDraft;

/// Position in the booking flow, serialized as its ordinal (1–4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Step {
    ServiceAndTime = 1,
    Contact = 2,
    Concern = 3,
    /// Booking accepted; terminal for the session
    Confirmed = 4,
}

impl Step {
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn is_terminal(self) -> bool {
        self == Step::Confirmed
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> Self {
        step.ordinal()
    }
}

impl TryFrom<u8> for Step {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Step::ServiceAndTime),
            2 => Ok(Step::Contact),
            3 => Ok(Step::Concern),
            4 => Ok(Step::Confirmed),
            other => Err(format!("no booking step {}", other)),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::ServiceAndTime => "service_and_time",
            Step::Contact => "contact",
            Step::Concern => "concern",
            Step::Confirmed => "confirmed",
        };
        f.write_str(name)
    }
}

/// What pressing "next" does once a step is complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextAction {
    /// Move to the next step in the flow
    Continue,
    /// Hand the draft to the booking backend; success moves on
    Submit,
    /// Nothing follows
    End,
}

/// Core trait implemented by every step of the booking flow
pub trait WizardStep: Send + Sync {
    /// Which step this is
    fn id(&self) -> Step;

    /// Names of required fields that are still empty
    fn missing_fields(&self, draft: &BookingDraft) -> Vec<&'static str>;

    /// Gate predicate: may the user leave this step forwards?
    fn is_complete(&self, draft: &BookingDraft) -> bool {
        self.missing_fields(draft).is_empty()
    }

    fn next_action(&self) -> NextAction {
        NextAction::Continue
    }
}

/// Step 1: pick a service, a day and a time
pub struct ServiceAndTimeStep;

impl WizardStep for ServiceAndTimeStep {
    fn id(&self) -> Step {
        Step::ServiceAndTime
    }

    fn missing_fields(&self, draft: &BookingDraft) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if draft.selected_service.is_none() {
            missing.push("selectedService");
        }
        if draft.selected_date.is_none() {
            missing.push("selectedDate");
        }
        if draft.selected_slot.as_ref().is_none_or(String::is_empty) {
            missing.push("selectedSlot");
        }
        missing
    }
}

/// Step 2: contact details. Age, gender and first-visit are optional.
pub struct ContactStep;

impl WizardStep for ContactStep {
    fn id(&self) -> Step {
        Step::Contact
    }

    fn missing_fields(&self, draft: &BookingDraft) -> Vec<&'static str> {
        [
            ("firstName", &draft.first_name),
            ("lastName", &draft.last_name),
            ("email", &draft.email),
            ("phone", &draft.phone),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Step 3: the client's concern and consent, then submission
pub struct ConcernStep;

impl WizardStep for ConcernStep {
    fn id(&self) -> Step {
        Step::Concern
    }

    fn missing_fields(&self, draft: &BookingDraft) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if draft.concern.is_empty() {
            missing.push("concern");
        }
        if !draft.consent {
            missing.push("consent");
        }
        missing
    }

    fn next_action(&self) -> NextAction {
        NextAction::Submit
    }
}

/// Step 4: booking confirmed
pub struct ConfirmedStep;

impl WizardStep for ConfirmedStep {
    fn id(&self) -> Step {
        Step::Confirmed
    }

    fn missing_fields(&self, _draft: &BookingDraft) -> Vec<&'static str> {
        Vec::new()
    }

    fn is_complete(&self, _draft: &BookingDraft) -> bool {
        false
    }

    fn next_action(&self) -> NextAction {
        NextAction::End
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use chrono::NaiveDate;

    #[test]
    fn step_serializes_as_ordinal() {
        assert_eq!(serde_json::to_string(&Step::Concern).unwrap(), "3");
        assert_eq!(serde_json::from_str::<Step>("4").unwrap(), Step::Confirmed);
        assert!(serde_json::from_str::<Step>("5").is_err());
    }

    #[test]
    fn service_step_reports_each_missing_selection() {
        let mut draft = BookingDraft::default();
        assert_eq!(
            ServiceAndTimeStep.missing_fields(&draft),
            vec!["selectedService", "selectedDate", "selectedSlot"]
        );

        draft.selected_date = NaiveDate::from_ymd_opt(2026, 10, 20);
        draft.selected_slot = Some("9:00".to_string());
        assert_eq!(ServiceAndTimeStep.missing_fields(&draft), vec!["selectedService"]);
        assert!(!ServiceAndTimeStep.is_complete(&draft));

        draft.selected_service = Catalog::builtin().find("neuro").cloned();
        draft.selected_slot = Some(String::new());
        assert_eq!(ServiceAndTimeStep.missing_fields(&draft), vec!["selectedSlot"]);
    }

    #[test]
    fn concern_step_needs_consent_and_concern() {
        let mut draft = BookingDraft {
            concern: "Rückenschmerzen".to_string(),
            ..Default::default()
        };
        assert!(!ConcernStep.is_complete(&draft));
        draft.consent = true;
        assert!(ConcernStep.is_complete(&draft));
        assert_eq!(ConcernStep.next_action(), NextAction::Submit);
    }

    #[test]
    fn confirmed_step_never_completes() {
        assert!(!ConfirmedStep.is_complete(&BookingDraft::default()));
        assert_eq!(ConfirmedStep.next_action(), NextAction::End);
    }
}
