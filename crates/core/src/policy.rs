//! Resolution policy for timestamp/order disagreements

/// What the store does when a record's `timestamp` ordering disagrees with
/// its `event_order` ordering inside the same case.
///
/// | Policy | Behaviour |
/// |--------|-----------|
/// | Reject | Append fails with `OrderingViolation` (default) |
/// | TrustOrder | Record is accepted; `event_order` stays authoritative |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingPolicy {
    /// Reject records whose timestamp is earlier than their predecessor's or
    /// later than their successor's.
    #[default]
    Reject,
    /// Accept timestamp skew and keep the order given by `event_order`.
    TrustOrder,
}

impl OrderingPolicy {
    /// Whether timestamp monotonicity is enforced on append
    pub fn enforces_monotonic_time(&self) -> bool {
        matches!(self, OrderingPolicy::Reject)
    }
}
