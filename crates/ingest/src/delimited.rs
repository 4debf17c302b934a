//! CSV import and export
//!
//! The header row names the columns, with the same aliases as JSON input
//! (`user`, `queue_id`, `assignment_group`). Rows may be short; missing
//! trailing columns count as absent. As with JSON Lines, a bad row is
//! reported with the line it starts on and only I/O failures abort.

use crate::error::{IngestError, Result};
use crate::normalize::NormalizeOptions;
use crate::raw::RawRecord;
use crate::report::{append_parsed, ImportReport, LineError};
use csv::{ByteRecord, ReaderBuilder, Trim, WriterBuilder};
use std::io::{Read, Write};
use ticketlog_core::{Event, NewEvent};
use ticketlog_storage::EventLogStore;
use tracing::debug;

/// Parse every row into a candidate, keeping line numbers
///
/// Same shape as [`parse_jsonl`](crate::parse_jsonl): `(line, candidate)`
/// pairs for rows that parsed and a [`LineError`] for each row that did not.
/// Empty lines are skipped.
pub fn parse_csv<R: Read>(reader: R) -> Result<(Vec<(usize, NewEvent)>, Vec<LineError>)> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.byte_headers()?.clone();

    let mut parsed = Vec::new();
    let mut failed = Vec::new();
    let mut record = ByteRecord::new();
    let mut row = 0;

    while rdr.read_byte_record(&mut record)? {
        row += 1;
        let number = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(row + 1);
        let candidate = record
            .deserialize::<RawRecord>(Some(&headers))
            .map_err(IngestError::from)
            .and_then(RawRecord::into_candidate);
        match candidate {
            Ok(c) => parsed.push((number, c)),
            Err(error) => {
                debug!(line = number, %error, "Unparseable row");
                failed.push(LineError {
                    line: number,
                    error,
                });
            }
        }
    }

    Ok((parsed, failed))
}

/// Read CSV from `reader` and append every row to `store`
///
/// `normalize` works as for [`import_jsonl`](crate::import_jsonl).
pub fn import_csv<R: Read>(
    reader: R,
    store: &EventLogStore,
    normalize: Option<&NormalizeOptions>,
) -> Result<ImportReport> {
    let (parsed, rejected) = parse_csv(reader)?;
    Ok(append_parsed(parsed, rejected, store, normalize))
}

/// Write events as CSV with a header row, returning the number written
///
/// Absent optional fields become empty cells.
pub fn write_csv<'a, W, I>(writer: W, events: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a Event>,
{
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);
    let mut count = 0;
    for event in events {
        wtr.serialize(event)?;
        count += 1;
    }
    wtr.flush()?;
    Ok(count)
}
