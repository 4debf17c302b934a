//! Durability mode for WAL operations.
//!
//! Defines when appended events are fsynced to disk.

/// Durability mode for WAL writes.
///
/// # Mode Comparison
///
/// | Mode | Sync point | Use Case |
/// |------|------------|----------|
/// | None | never (no WAL file) | Tests, scratch analysis |
/// | Batched | every N appends or T ms | Bulk ingestion (default) |
/// | Strict | every append | Audit-grade logs |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityMode {
    /// No durability - all data lost when the store is dropped.
    ///
    /// No WAL file is created.
    None,

    /// fsync after every append (slow, maximum durability).
    Strict,

    /// fsync every `batch_size` appends OR once `interval_ms` has passed
    /// since the last sync, whichever comes first.
    ///
    /// The interval is checked on append; there is no background flusher,
    /// so an idle store syncs on the next append, `flush()` or close.
    Batched {
        /// Maximum time between fsyncs in milliseconds
        interval_ms: u64,
        /// Maximum appends between fsyncs
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// Check if this mode requires a WAL file.
    pub fn requires_wal(&self) -> bool {
        !matches!(self, DurabilityMode::None)
    }

    /// Check if this mode syncs on every append.
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Strict)
    }

    /// Human-readable description of the mode.
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::None => "No durability (in memory only)",
            DurabilityMode::Strict => "Sync fsync (safest, slowest)",
            DurabilityMode::Batched { .. } => "Batched fsync (balanced speed/safety)",
        }
    }

    /// Batched mode with recommended defaults: 100ms or 1000 appends.
    pub fn buffered_default() -> Self {
        DurabilityMode::Batched {
            interval_ms: 100,
            batch_size: 1000,
        }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        Self::buffered_default()
    }
}
