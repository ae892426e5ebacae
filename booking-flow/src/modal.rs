//! BookingModal – one booking session as the web shell sees it: opened, edited, advanced,
//! closed.
//!
//! The synchronous [`BookingWizard`] decides *whether* something may happen. `BookingModal`
//! adds the parts that involve time:
//!
//! * the availability lookup started on every open,
//! * the booking submission started from the concern step,
//! * the delayed draft reset after the modal is closed.
//!
//! Every open and close bumps an epoch. Results of lookups and submissions that were started
//! under an older epoch are dropped on arrival, so closing the modal while something is in
//! flight never mutates the (possibly already reset) draft.
//!
//! A submission keeps the session busy until the backend answers, even across a close and
//! reopen. There is never more than one booking outstanding per session.
//!
//! The handle is cheap to clone; all clones share one session. The inner lock is never held
//! across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::{
    availability::{AvailabilitySource, DayAvailability, MockAvailability},
    catalog::Catalog,
    config::BookingConfig,
    draft::{BookingDraft, FieldUpdate},
    error::{BookingError, Result},
    flow::BookingFlow,
    pricing::PriceQuote,
    step::Step,
    submission::{BookingBackend, BookingConfirmation, MockBookingBackend},
    wizard::{BookingWizard, ConfirmationSummary, Transition},
};

/// Everything a session needs besides its own state.
#[derive(Clone)]
pub struct BookingServices {
    pub flow: Arc<BookingFlow>,
    pub catalog: Arc<Catalog>,
    pub availability: Arc<dyn AvailabilitySource>,
    pub backend: Arc<dyn BookingBackend>,
    pub config: Arc<BookingConfig>,
}

impl BookingServices {
    /// Standard flow and catalog backed by the in-memory mocks.
    pub fn with_mocks(config: BookingConfig) -> Self {
        let availability = MockAvailability::new(
            config.availability.clone(),
            config.availability_latency(),
        );
        let backend = MockBookingBackend::new(config.submission_latency());
        Self {
            flow: Arc::new(BookingFlow::standard()),
            catalog: Arc::new(Catalog::builtin()),
            availability: Arc::new(availability),
            backend: Arc::new(backend),
            config: Arc::new(config),
        }
    }
}

/// Calendar state for the current open
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "days", rename_all = "snake_case")]
pub enum AvailabilityState {
    Idle,
    Loading,
    Ready(Arc<Vec<DayAvailability>>),
    Failed(String),
}

/// Outcome of pressing "next"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    Moved { step: Step },
    Blocked { missing: Vec<&'static str> },
    /// A submission is already in flight
    Busy,
    Confirmed { confirmation: BookingConfirmation },
    SubmissionFailed { notice: String },
    /// The session was closed while submitting; the result was dropped
    Discarded,
    Finished,
}

/// Read-only snapshot for rendering
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub session_id: String,
    pub is_open: bool,
    pub step: Step,
    pub is_terminal: bool,
    pub draft: BookingDraft,
    pub can_advance: bool,
    pub can_retreat: bool,
    pub missing_fields: Vec<&'static str>,
    pub submitting: bool,
    pub availability_loading: bool,
    pub quote: Option<PriceQuote>,
    pub price_hint: Option<PriceQuote>,
    pub notice: Option<String>,
    pub confirmation: Option<BookingConfirmation>,
    pub summary: Option<ConfirmationSummary>,
}

struct ModalState {
    wizard: BookingWizard,
    is_open: bool,
    epoch: u64,
    availability: AvailabilityState,
    /// A backend call is outstanding. Only the submitting `advance` clears it.
    submitting: bool,
    notice: Option<String>,
    confirmation: Option<BookingConfirmation>,
}

#[derive(Clone)]
pub struct BookingModal {
    id: String,
    services: BookingServices,
    state: Arc<Mutex<ModalState>>,
    availability_settled: Arc<Notify>,
}

impl BookingModal {
    /// Create a closed session with an empty draft.
    pub fn new(id: impl Into<String>, services: BookingServices) -> Self {
        let wizard = BookingWizard::new(services.flow.clone(), services.catalog.clone());
        Self {
            id: id.into(),
            services,
            state: Arc::new(Mutex::new(ModalState {
                wizard,
                is_open: false,
                epoch: 0,
                availability: AvailabilityState::Idle,
                submitting: false,
                notice: None,
                confirmation: None,
            })),
            availability_settled: Arc::new(Notify::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    fn lock(&self) -> MutexGuard<'_, ModalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_open
    }

    /// Open the wizard and start the availability lookup for the window
    /// beginning at `window_start`.
    ///
    /// A known `preselected_service` is selected; an unknown one clears the
    /// selection. Opening an already open session does nothing, including the
    /// preselection, and returns `false`.
    /// Must be called from within a Tokio runtime.
    pub fn open(&self, preselected_service: Option<&str>, window_start: NaiveDate) -> bool {
        let epoch = {
            let mut state = self.lock();
            if state.is_open {
                debug!(session_id = %self.id, "Session already open, ignoring open");
                return false;
            }
            state.is_open = true;
            state.epoch += 1;
            if let Some(service_id) = preselected_service {
                state.wizard.preselect_service(service_id);
            }
            state.availability = AvailabilityState::Loading;
            state.epoch
        };
        info!(session_id = %self.id, epoch, "Booking wizard opened");

        let modal = self.clone();
        tokio::spawn(async move {
            let result = modal.services.availability.fetch(window_start).await;
            modal.finish_availability(epoch, result);
        });
        true
    }

    fn finish_availability(&self, epoch: u64, result: Result<Vec<DayAvailability>>) {
        {
            let mut state = self.lock();
            if state.epoch != epoch || !state.is_open {
                debug!(session_id = %self.id, epoch, "Dropping availability for a closed session");
                return;
            }
            state.availability = match result {
                Ok(days) => AvailabilityState::Ready(Arc::new(days)),
                Err(e) => {
                    warn!(session_id = %self.id, error = %e, "Availability lookup failed");
                    AvailabilityState::Failed(e.to_string())
                }
            };
        }
        self.availability_settled.notify_waiters();
    }

    /// Calendar for the current open, as far as it has loaded.
    pub fn availability(&self) -> AvailabilityState {
        self.lock().availability.clone()
    }

    /// Wait until the lookup for the current open has settled (or the session closed).
    pub async fn wait_for_availability(&self) -> AvailabilityState {
        loop {
            let settled = self.availability_settled.notified();
            {
                let state = self.lock();
                if state.availability != AvailabilityState::Loading {
                    return state.availability.clone();
                }
            }
            settled.await;
        }
    }

    /// Close the wizard. The draft is reset once the grace period has passed,
    /// unless the session was reopened in the meantime.
    pub fn close(&self) {
        let epoch = {
            let mut state = self.lock();
            if !state.is_open {
                return;
            }
            state.is_open = false;
            state.epoch += 1;
            if state.availability == AvailabilityState::Loading {
                state.availability = AvailabilityState::Idle;
            }
            state.epoch
        };
        self.availability_settled.notify_waiters();
        info!(session_id = %self.id, epoch, "Booking wizard closed");

        let grace = self.services.config.reset_grace();
        if grace.is_zero() {
            self.reset_if_closed(epoch);
        } else {
            let modal = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(grace).await;
                modal.reset_if_closed(epoch);
            });
        }
    }

    fn reset_if_closed(&self, epoch: u64) {
        let mut state = self.lock();
        if state.is_open || state.epoch != epoch {
            debug!(session_id = %self.id, epoch, "Skipping reset, session was reopened");
            return;
        }
        state.wizard.reset();
        state.availability = AvailabilityState::Idle;
        state.notice = None;
        state.confirmation = None;
        debug!(session_id = %self.id, "Booking draft reset");
    }

    /// Apply one form edit to the draft.
    pub fn set_field(&self, update: FieldUpdate) -> Result<()> {
        let mut state = self.lock();
        if !state.is_open {
            return Err(BookingError::SessionClosed);
        }
        state.wizard.apply(update)
    }

    pub fn draft(&self) -> BookingDraft {
        self.lock().wizard.draft().clone()
    }

    /// Press "next".
    ///
    /// On the concern step this submits the draft. A failed submission is
    /// turned into a notice and leaves the wizard on the concern step with
    /// the draft unchanged, ready for another attempt.
    pub async fn advance(&self) -> Result<AdvanceOutcome> {
        let (epoch, payload) = {
            let mut state = self.lock();
            if !state.is_open {
                return Err(BookingError::SessionClosed);
            }
            if state.submitting {
                return Ok(AdvanceOutcome::Busy);
            }
            match state.wizard.advance() {
                Transition::Moved { to, .. } => return Ok(AdvanceOutcome::Moved { step: to }),
                Transition::Blocked { missing, .. } => return Ok(AdvanceOutcome::Blocked { missing }),
                Transition::Finished => return Ok(AdvanceOutcome::Finished),
                Transition::SubmissionRequired => {
                    state.submitting = true;
                    state.notice = None;
                    (state.epoch, state.wizard.draft().clone())
                }
            }
        };

        info!(session_id = %self.id, epoch, "Submitting booking");
        let result = self.services.backend.submit(&payload).await;

        let mut state = self.lock();
        state.submitting = false;
        if state.epoch != epoch {
            debug!(session_id = %self.id, epoch, "Dropping submission result for a closed session");
            return Ok(AdvanceOutcome::Discarded);
        }

        let failure = match result {
            Ok(confirmation) if confirmation.success => {
                state.wizard.complete_submission();
                state.confirmation = Some(confirmation.clone());
                info!(session_id = %self.id, confirmation_id = %confirmation.id, "Booking confirmed");
                return Ok(AdvanceOutcome::Confirmed { confirmation });
            }
            Ok(confirmation) => {
                BookingError::SubmissionFailure(format!("backend declined booking {}", confirmation.id))
            }
            Err(BookingError::SubmissionFailure(reason)) => BookingError::SubmissionFailure(reason),
            Err(e) => BookingError::SubmissionFailure(e.to_string()),
        };

        error!(session_id = %self.id, error = %failure, "Booking submission failed");
        let notice = self.services.config.failure_notice.clone();
        state.notice = Some(notice.clone());
        Ok(AdvanceOutcome::SubmissionFailed { notice })
    }

    /// Press "back". Returns the new step, or `None` if going back is not offered.
    pub fn retreat(&self) -> Result<Option<Step>> {
        let mut state = self.lock();
        if !state.is_open {
            return Err(BookingError::SessionClosed);
        }
        if state.submitting {
            return Ok(None);
        }
        Ok(state.wizard.retreat())
    }

    /// Acknowledge the failure notice.
    pub fn dismiss_notice(&self) -> Result<()> {
        let mut state = self.lock();
        if !state.is_open {
            return Err(BookingError::SessionClosed);
        }
        state.notice = None;
        Ok(())
    }

    pub fn view(&self) -> WizardView {
        let state = self.lock();
        let pricing = &self.services.config.pricing;
        let wizard = &state.wizard;
        WizardView {
            session_id: self.id.clone(),
            is_open: state.is_open,
            step: wizard.step(),
            is_terminal: wizard.step().is_terminal(),
            draft: wizard.draft().clone(),
            can_advance: state.is_open && !state.submitting && wizard.can_advance(),
            can_retreat: state.is_open && !state.submitting && wizard.can_retreat(),
            missing_fields: wizard.missing_fields(),
            submitting: state.submitting,
            availability_loading: state.availability == AvailabilityState::Loading,
            quote: wizard.quote(pricing),
            price_hint: wizard.price_hint(pricing),
            notice: state.notice.clone(),
            confirmation: state.confirmation.clone(),
            summary: state
                .confirmation
                .as_ref()
                .and_then(|confirmation| wizard.summary(confirmation, pricing)),
        }
    }
}
