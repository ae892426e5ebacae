pub mod availability;
pub mod catalog;
pub mod config;
pub mod draft;
pub mod error;
pub mod flow;
pub mod modal;
pub mod pricing;
pub mod settings;
pub mod step;
pub mod storage;
pub mod submission;
pub mod wizard;

// Re-export commonly used types
pub use availability::{AvailabilitySource, DayAvailability, MockAvailability, TimeSlot, generate};
pub use catalog::{Catalog, Service};
pub use config::{AvailabilityRules, BookingConfig};
pub use draft::{BookingDraft, FieldUpdate, Gender};
pub use error::{BookingError, Result};
pub use flow::BookingFlow;
pub use modal::{AdvanceOutcome, AvailabilityState, BookingModal, BookingServices, WizardView};
pub use pricing::{PriceQuote, PricingConfig, SessionRate};
pub use settings::{FileSettingsStore, InMemorySettingsStore, SettingsStore, Theme, ThemeSettings};
pub use step::{NextAction, Step};
pub use storage::{InMemorySessionStorage, SessionStorage, evict_after_close};
pub use submission::{BookingBackend, BookingConfirmation, MockBookingBackend};
pub use wizard::{BookingWizard, ConfirmationSummary, Transition};
