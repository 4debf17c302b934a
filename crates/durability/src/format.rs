//! On-disk byte format of the WAL.
//!
//! ```text
//! header:  [magic "TKLW" (4)][format version u32 LE (4)]
//! record:  [payload len u32 LE (4)][crc32 of len u32 LE (4)][crc32 of payload u32 LE (4)][payload]
//! payload: bincode(Event)
//! ```
//!
//! The length carries its own checksum, so a damaged length is told apart
//! from a record cut short by a crash.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use ticketlog_core::{Error, Event, Result};

/// File magic
pub const MAGIC: &[u8; 4] = b"TKLW";

/// Current format version
pub const FORMAT_VERSION: u32 = 2;

/// Bytes in the file header
pub const HEADER_SIZE: usize = 8;

/// Bytes in each record's length + checksums prefix
pub const RECORD_PREFIX_SIZE: usize = 12;

/// Largest payload accepted on read; anything bigger is a damaged length field
pub const MAX_RECORD_SIZE: usize = 16 * 1024 * 1024;

/// Encode the file header
pub fn encode_header() -> [u8; HEADER_SIZE] {
    let mut buf = [0u8; HEADER_SIZE];
    buf[..4].copy_from_slice(MAGIC);
    LittleEndian::write_u32(&mut buf[4..], FORMAT_VERSION);
    buf
}

/// Check a file header
pub fn decode_header(bytes: &[u8]) -> Result<()> {
    if bytes.len() < HEADER_SIZE {
        return Err(Error::Corruption(format!(
            "WAL header too short: {} bytes",
            bytes.len()
        )));
    }
    if &bytes[..4] != MAGIC {
        return Err(Error::Corruption("WAL magic mismatch".to_string()));
    }
    let version = LittleEndian::read_u32(&bytes[4..HEADER_SIZE]);
    if version != FORMAT_VERSION {
        return Err(Error::Corruption(format!(
            "unsupported WAL format version {}",
            version
        )));
    }
    Ok(())
}

/// Encode one event as a complete record (prefix + payload)
pub fn encode_record(event: &Event) -> Result<Vec<u8>> {
    let payload = bincode::serialize(event).map_err(|e| Error::Serialization(e.to_string()))?;
    let crc = crc32fast::hash(&payload);

    let len = (payload.len() as u32).to_le_bytes();

    let mut buf = Vec::with_capacity(RECORD_PREFIX_SIZE + payload.len());
    buf.extend_from_slice(&len);
    buf.write_u32::<LittleEndian>(crc32fast::hash(&len))?;
    buf.write_u32::<LittleEndian>(crc)?;
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decode a record prefix into `(payload len, payload crc)`
///
/// `None` when the prefix is short, the length fails its checksum, or the
/// length exceeds [`MAX_RECORD_SIZE`].
pub fn decode_prefix(bytes: &[u8]) -> Option<(usize, u32)> {
    if bytes.len() < RECORD_PREFIX_SIZE {
        return None;
    }
    if crc32fast::hash(&bytes[..4]) != LittleEndian::read_u32(&bytes[4..8]) {
        return None;
    }
    let len = LittleEndian::read_u32(&bytes[..4]) as usize;
    if len > MAX_RECORD_SIZE {
        return None;
    }
    Some((len, LittleEndian::read_u32(&bytes[8..RECORD_PREFIX_SIZE])))
}

/// Position of the first complete, verified record in `bytes`
///
/// Used to resume reading after a record whose length is damaged.
pub fn find_record(bytes: &[u8]) -> Option<usize> {
    (0..bytes.len().saturating_sub(RECORD_PREFIX_SIZE - 1)).find(|&pos| {
        let rest = &bytes[pos..];
        match decode_prefix(rest) {
            Some((len, crc)) => {
                rest.len() >= RECORD_PREFIX_SIZE + len
                    && crc32fast::hash(&rest[RECORD_PREFIX_SIZE..RECORD_PREFIX_SIZE + len]) == crc
            }
            None => false,
        }
    })
}

/// Decode a payload whose checksum has already been verified
pub fn decode_record(payload: &[u8]) -> Result<Event> {
    bincode::deserialize(payload).map_err(|e| Error::Serialization(e.to_string()))
}
