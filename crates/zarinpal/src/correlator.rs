//! In-memory correlation of gateway authority tokens to requested amounts.

use dashmap::DashMap;

/// Maps each pending authority token to the amount that was requested for it.
///
/// One entry exists per in-flight payment, inserted after the gateway
/// approves the payment-request and consumed by the verification callback.
/// Entries for abandoned payments are never swept; the store grows for the
/// life of the process.
///
/// Thread-safe; constructed once per process and shared by reference.
#[derive(Debug, Default)]
pub struct TransactionCorrelator {
    pending: DashMap<String, u64>,
}

impl TransactionCorrelator {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    /// Record the requested amount for an authority token.
    ///
    /// The gateway is the sole issuer of authority tokens, so a key that is
    /// already present is a data anomaly; last write wins and the collision
    /// is logged.
    pub fn record(&self, authority: impl Into<String>, amount: u64) {
        let authority = authority.into();
        if let Some(previous) = self.pending.insert(authority.clone(), amount) {
            tracing::warn!(
                authority = %authority,
                previous_amount = previous,
                amount,
                "authority token collision, overwriting pending amount"
            );
        }
    }

    /// Atomically read and delete the amount for an authority token.
    ///
    /// Returns `None` when no entry exists. This is the only read path at
    /// verification time: a second take for the same token, concurrent or
    /// sequential, always observes `None`.
    pub fn take_amount(&self, authority: &str) -> Option<u64> {
        self.pending.remove(authority).map(|(_, amount)| amount)
    }

    /// Number of in-flight payments currently held.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
