use serde::{Deserialize, Serialize};

use crate::catalog::Service;

/// Fixed duration and price applied to a session-dependent service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRate {
    pub duration: String,
    pub price: u32,
}

/// Business values for the session-dependent service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub currency: String,
    pub first_session: SessionRate,
    pub follow_up: SessionRate,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency: "CHF".to_string(),
            first_session: SessionRate {
                duration: "1 Std. 15 Min.".to_string(),
                price: 150,
            },
            follow_up: SessionRate {
                duration: "1 Std.".to_string(),
                price: 120,
            },
        }
    }
}

/// Duration and price to display for the current selection.
///
/// Always computed on demand; the draft never stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceQuote {
    /// The service's own base values
    Base {
        duration: String,
        price: u32,
        price_range: Option<String>,
    },
    /// First-session or follow-up override
    Session {
        first_session: bool,
        duration: String,
        price: u32,
    },
}

impl PriceQuote {
    pub fn duration(&self) -> &str {
        match self {
            PriceQuote::Base { duration, .. } | PriceQuote::Session { duration, .. } => duration,
        }
    }

    pub fn price(&self) -> u32 {
        match self {
            PriceQuote::Base { price, .. } | PriceQuote::Session { price, .. } => *price,
        }
    }

    /// Price label, preferring a configured range for base quotes ("CHF 120 – 150").
    pub fn price_label(&self, currency: &str) -> String {
        match self {
            PriceQuote::Base {
                price_range: Some(range),
                ..
            } => format!("{} {}", currency, range),
            _ => format!("{} {}", currency, self.price()),
        }
    }

    pub fn is_override(&self) -> bool {
        matches!(self, PriceQuote::Session { .. })
    }
}

/// Derive the display quote for `service`.
///
/// Only services flagged with session-dependent pricing consult
/// `is_first_session`; an unanswered question yields the base values.
pub fn quote(service: &Service, is_first_session: Option<bool>, pricing: &PricingConfig) -> PriceQuote {
    match (service.session_dependent_pricing, is_first_session) {
        (true, Some(first_session)) => {
            let rate = if first_session {
                &pricing.first_session
            } else {
                &pricing.follow_up
            };
            PriceQuote::Session {
                first_session,
                duration: rate.duration.clone(),
                price: rate.price,
            }
        }
        _ => PriceQuote::Base {
            duration: service.duration.clone(),
            price: service.price,
            price_range: service.price_range.clone(),
        },
    }
}
