use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{draft::BookingDraft, error::Result};

/// Result of handing a completed draft to the booking backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub success: bool,
    pub id: String,
}

/// Where completed bookings are sent.
///
/// Implementations report failure either as an `Err` or as a confirmation
/// with `success == false`; the wizard treats both as a failed submission.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn submit(&self, draft: &BookingDraft) -> Result<BookingConfirmation>;
}

/// Placeholder backend: logs the payload, waits, and always accepts.
pub struct MockBookingBackend {
    latency: Duration,
}

impl MockBookingBackend {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl BookingBackend for MockBookingBackend {
    async fn submit(&self, draft: &BookingDraft) -> Result<BookingConfirmation> {
        let payload = serde_json::to_string_pretty(draft)?;
        info!(payload = %payload, "Booking submission payload");

        tokio::time::sleep(self.latency).await;

        let confirmation = BookingConfirmation {
            success: true,
            id: Uuid::new_v4().simple().to_string(),
        };
        info!(confirmation_id = %confirmation.id, "Booking accepted");
        Ok(confirmation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn mock_backend_always_confirms_with_fresh_id() {
        let backend = MockBookingBackend::new(Duration::from_millis(1500));
        let draft = BookingDraft::default();

        let first = backend.submit(&draft).await.unwrap();
        let second = backend.submit(&draft).await.unwrap();

        assert!(first.success);
        assert!(!first.id.is_empty());
        assert_ne!(first.id, second.id);
    }
}
