//! Warranty fee policy.
//!
//! The invoice amount for a payment request is computed by a [`FeePolicy`].
//! Amounts are whole Toman.

/// Attributes of a case that a fee policy may price on.
#[derive(Debug, Clone, Copy)]
pub struct FeeInput<'a> {
    pub model_name: &'a str,
    pub production_year: i64,
}

/// Computes the warranty fee for a case.
pub trait FeePolicy: Send + Sync {
    fn amount_for(&self, input: FeeInput<'_>) -> i64;
}

/// Charges the same amount for every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedFee(pub i64);

impl FixedFee {
    pub const DEFAULT_AMOUNT: i64 = 500_000;
}

impl Default for FixedFee {
    fn default() -> Self {
        Self(Self::DEFAULT_AMOUNT)
    }
}

impl FeePolicy for FixedFee {
    fn amount_for(&self, _input: FeeInput<'_>) -> i64 {
        self.0
    }
}
