//! JSON Lines import and export
//!
//! One JSON object per line. Import never stops on a bad line: parse and
//! validation failures are collected in the [`ImportReport`] with their
//! 1-based line number. Only I/O failures abort.

use crate::error::{IngestError, Result};
use crate::normalize::NormalizeOptions;
use crate::raw::RawRecord;
use crate::report::{append_parsed, ImportReport, LineError};
use std::io::{BufRead, Write};
use ticketlog_core::{Event, NewEvent};
use ticketlog_storage::EventLogStore;
use tracing::debug;

/// Parse every line into a candidate, keeping line numbers
///
/// Returns `(line, candidate)` pairs for lines that parsed and a
/// [`LineError`] for each line that did not. Blank lines are skipped.
pub fn parse_jsonl<R: BufRead>(reader: R) -> Result<(Vec<(usize, NewEvent)>, Vec<LineError>)> {
    let mut parsed = Vec::new();
    let mut failed = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let number = idx + 1;
        let candidate = serde_json::from_str::<RawRecord>(&line)
            .map_err(IngestError::from)
            .and_then(RawRecord::into_candidate);
        match candidate {
            Ok(c) => parsed.push((number, c)),
            Err(error) => {
                debug!(line = number, %error, "Unparseable line");
                failed.push(LineError {
                    line: number,
                    error,
                });
            }
        }
    }

    Ok((parsed, failed))
}

/// Read JSON Lines from `reader` and append every record to `store`
///
/// With `normalize` set, the parsed records are normalized as a whole before
/// the first append, so `event_order` and `duration_sec` may be derived.
pub fn import_jsonl<R: BufRead>(
    reader: R,
    store: &EventLogStore,
    normalize: Option<&NormalizeOptions>,
) -> Result<ImportReport> {
    let (parsed, rejected) = parse_jsonl(reader)?;
    Ok(append_parsed(parsed, rejected, store, normalize))
}

/// Write events as JSON Lines, returning the number written
pub fn write_jsonl<'a, W, I>(mut writer: W, events: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a Event>,
{
    let mut count = 0;
    for event in events {
        serde_json::to_writer(&mut writer, event)?;
        writer.write_all(b"\n")?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}
