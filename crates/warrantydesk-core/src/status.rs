//! Warranty case lifecycle.
//!
//! A vehicle's case moves forward through
//! `Submitted -> AwaitingDocuments -> UnderReview -> AwaitingPayment -> Completed`.
//! `Rejected` can be reached from any non-terminal state. `Completed` and
//! `Rejected` are terminal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Status of a vehicle's warranty case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseStatus {
    #[default]
    Submitted,
    AwaitingDocuments,
    UnderReview,
    AwaitingPayment,
    Completed,
    Rejected,
}

impl CaseStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Submitted,
        Self::AwaitingDocuments,
        Self::UnderReview,
        Self::AwaitingPayment,
        Self::Completed,
        Self::Rejected,
    ];

    /// Stable textual form used in storage and API payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::AwaitingDocuments => "AwaitingDocuments",
            Self::UnderReview => "UnderReview",
            Self::AwaitingPayment => "AwaitingPayment",
            Self::Completed => "Completed",
            Self::Rejected => "Rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// A payment request may be raised from any open state, so every
    /// non-terminal status may move to `AwaitingPayment`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Self::Submitted, Self::AwaitingDocuments)
                | (Self::AwaitingDocuments, Self::UnderReview)
                | (Self::AwaitingPayment, Self::Completed)
                | (_, Self::AwaitingPayment | Self::Rejected)
        )
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::UnknownStatus(s.to_string()))
    }
}
