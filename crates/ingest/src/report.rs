//! Import outcome and the shared append step
//!
//! Every input format parses into `(line, candidate)` pairs plus per-line
//! failures; [`append_parsed`] takes it from there.

use crate::error::IngestError;
use crate::normalize::{normalize_by, NormalizeOptions};
use ticketlog_core::NewEvent;
use ticketlog_storage::EventLogStore;
use tracing::{debug, info, warn};

/// A line that could not be imported
#[derive(Debug)]
pub struct LineError {
    /// 1-based line number in the input
    pub line: usize,
    /// Why it failed
    pub error: IngestError,
}

/// Outcome of an import
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Non-blank lines read
    pub lines_read: usize,
    /// Events accepted by the store
    pub accepted: usize,
    /// Lines that failed to parse or were rejected, in input order
    pub rejected: Vec<LineError>,
}

impl ImportReport {
    /// Whether every line was accepted
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    /// Human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Import complete: {} lines, {} accepted, {} rejected",
            self.lines_read,
            self.accepted,
            self.rejected.len()
        )
    }
}

/// Optionally normalize `parsed`, then append each candidate to `store`
///
/// Store rejections join `rejected`, and the report lists all failures in
/// line order.
pub(crate) fn append_parsed(
    mut parsed: Vec<(usize, NewEvent)>,
    mut rejected: Vec<LineError>,
    store: &EventLogStore,
    normalize: Option<&NormalizeOptions>,
) -> ImportReport {
    if let Some(options) = normalize {
        normalize_by(&mut parsed, |(_, c)| c, options);
    }

    let mut report = ImportReport {
        lines_read: parsed.len() + rejected.len(),
        ..Default::default()
    };

    for (line, candidate) in parsed {
        match store.append(candidate) {
            Ok(_) => report.accepted += 1,
            Err(e) => {
                debug!(line, error = %e, "Rejected line");
                rejected.push(LineError {
                    line,
                    error: e.into(),
                });
            }
        }
    }

    rejected.sort_by_key(|e| e.line);
    report.rejected = rejected;

    if report.is_clean() {
        info!("{}", report.summary());
    } else {
        warn!("{}", report.summary());
    }
    report
}
