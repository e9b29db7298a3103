//! Kinds of supporting document attached to a warranty case.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    DisabilityCard,
    VehicleCard,
    Contract,
    #[default]
    Other,
}

impl DocumentType {
    pub const ALL: [Self; 4] = [
        Self::DisabilityCard,
        Self::VehicleCard,
        Self::Contract,
        Self::Other,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DisabilityCard => "DisabilityCard",
            Self::VehicleCard => "VehicleCard",
            Self::Contract => "Contract",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = Error;

    /// Accepts the textual form in any case, or the numeric index used by
    /// form posts (`0` = `DisabilityCard` ... `3` = `Other`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(index) = s.parse::<usize>() {
            return Self::ALL
                .get(index)
                .copied()
                .ok_or_else(|| Error::UnknownDocumentType(s.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownDocumentType(s.to_string()))
    }
}
