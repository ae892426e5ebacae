use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::{
    catalog::Catalog,
    draft::{BookingDraft, FieldUpdate},
    error::Result,
    flow::BookingFlow,
    pricing::{PriceQuote, PricingConfig, quote},
    step::{NextAction, Step},
    submission::BookingConfirmation,
};

/// Outcome of pressing "next"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Moved { from: Step, to: Step },
    /// Gate not satisfied; nothing changed
    Blocked { step: Step, missing: Vec<&'static str> },
    /// Step is complete and its draft must go to the booking backend
    SubmissionRequired,
    /// Terminal step; nothing follows
    Finished,
}

/// Summary shown once a booking is confirmed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationSummary {
    pub confirmation_id: String,
    pub first_name: String,
    pub service_title: String,
    pub date: Option<NaiveDate>,
    pub slot: Option<String>,
    pub duration: String,
    pub price_label: String,
    pub email: String,
}

/// Synchronous booking state machine over one draft.
///
/// All step changes go through [`advance`](Self::advance),
/// [`complete_submission`](Self::complete_submission) and
/// [`retreat`](Self::retreat); form edits go through [`apply`](Self::apply).
#[derive(Clone)]
pub struct BookingWizard {
    flow: Arc<BookingFlow>,
    catalog: Arc<Catalog>,
    draft: BookingDraft,
}

impl BookingWizard {
    pub fn new(flow: Arc<BookingFlow>, catalog: Arc<Catalog>) -> Self {
        let draft = BookingDraft {
            step: flow.start_step(),
            ..Default::default()
        };
        Self {
            flow,
            catalog,
            draft,
        }
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn step(&self) -> Step {
        self.draft.step
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn apply(&mut self, update: FieldUpdate) -> Result<()> {
        self.draft.apply(update, &self.catalog)
    }

    /// Select `service_id` if it is in the catalog, otherwise clear the selection.
    pub fn preselect_service(&mut self, service_id: &str) {
        self.draft.selected_service = self.catalog.find(service_id).cloned();
    }

    /// Put the draft back to its initial state.
    pub fn reset(&mut self) {
        self.draft = BookingDraft {
            step: self.flow.start_step(),
            ..Default::default()
        };
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.flow
            .get_step(self.step())
            .map(|step| step.missing_fields(&self.draft))
            .unwrap_or_default()
    }

    /// Gate predicate of the current step
    pub fn can_advance(&self) -> bool {
        self.flow
            .get_step(self.step())
            .is_some_and(|step| step.next_action() != NextAction::End && step.is_complete(&self.draft))
    }

    pub fn can_retreat(&self) -> bool {
        self.flow.previous_step(self.step()).is_some()
    }

    /// Move forward if the current step's gate holds.
    ///
    /// A blocked advance leaves the draft untouched. A step whose next action
    /// is a submission does not move here; the caller submits and then reports
    /// back through [`complete_submission`](Self::complete_submission).
    pub fn advance(&mut self) -> Transition {
        let from = self.step();
        let Some(step) = self.flow.get_step(from) else {
            return Transition::Finished;
        };

        match step.next_action() {
            NextAction::End => Transition::Finished,
            _ if !step.is_complete(&self.draft) => Transition::Blocked {
                step: from,
                missing: step.missing_fields(&self.draft),
            },
            NextAction::Submit => Transition::SubmissionRequired,
            NextAction::Continue => match self.flow.next_step(from) {
                Some(to) => {
                    self.draft.step = to;
                    debug!(from = %from, to = %to, "Advanced booking step");
                    Transition::Moved { from, to }
                }
                None => Transition::Finished,
            },
        }
    }

    /// Record an accepted submission and move to the step after the submitting one.
    ///
    /// Returns `false`, changing nothing, if the wizard is not on a submitting step.
    pub fn complete_submission(&mut self) -> bool {
        let from = self.step();
        let submitting = self
            .flow
            .get_step(from)
            .is_some_and(|step| step.next_action() == NextAction::Submit);
        if !submitting {
            return false;
        }
        match self.flow.next_step(from) {
            Some(to) => {
                self.draft.step = to;
                debug!(from = %from, to = %to, "Booking submitted");
                true
            }
            None => false,
        }
    }

    /// Go back one step. Not possible from the first or the terminal step.
    pub fn retreat(&mut self) -> Option<Step> {
        let from = self.step();
        let to = self.flow.previous_step(from)?;
        self.draft.step = to;
        debug!(from = %from, to = %to, "Went back a booking step");
        Some(to)
    }

    /// Duration and price for the current selection, if a service is chosen.
    pub fn quote(&self, pricing: &PricingConfig) -> Option<PriceQuote> {
        let service = self.draft.selected_service.as_ref()?;
        Some(quote(service, self.draft.is_first_session, pricing))
    }

    /// First-session / follow-up hint shown on the contact step.
    ///
    /// Only present for the session-dependent service once the question is answered.
    pub fn price_hint(&self, pricing: &PricingConfig) -> Option<PriceQuote> {
        self.quote(pricing).filter(PriceQuote::is_override)
    }

    pub fn summary(
        &self,
        confirmation: &BookingConfirmation,
        pricing: &PricingConfig,
    ) -> Option<ConfirmationSummary> {
        if !self.step().is_terminal() {
            return None;
        }
        let service = self.draft.selected_service.as_ref()?;
        let quote = quote(service, self.draft.is_first_session, pricing);
        Some(ConfirmationSummary {
            confirmation_id: confirmation.id.clone(),
            first_name: self.draft.first_name.clone(),
            service_title: service.title.clone(),
            date: self.draft.selected_date,
            slot: self.draft.selected_slot.clone(),
            duration: quote.duration().to_string(),
            price_label: quote.price_label(&pricing.currency),
            email: self.draft.email.clone(),
        })
    }
}
