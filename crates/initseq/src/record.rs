//! Record walker over a raw command stream
//!
//! [`RecordReader`] splits a buffer into [`Record`] views without copying.
//! Construction and generation both walk the stream through it, so the two
//! passes always agree on record boundaries.

use crate::error::{Result, SequenceError};
use crate::wire::{
    read_u32_le, RecordKind, DMA_HEADER_LEN, MAX_SLOT_SIZE, RECORD_HEADER_LEN,
    SINGLE_WRITE_PAYLOAD_LEN, SLOT_TRAILER_LEN,
};

/// One tag + length + payload unit, borrowed from the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// Kind decoded from the tag byte
    pub kind: RecordKind,

    /// Offset of the tag byte within the stream
    pub offset: usize,

    /// Payload bytes (exactly `length` of them)
    pub payload: &'a [u8],

    encoded: &'a [u8],
}

/// Interpreted record contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Single register write
    SingleWrite {
        /// Destination address
        address: u32,
        /// Value written
        value: u32,
    },

    /// Resident-data slot declaration
    ResidentDataSlot {
        /// Slot name
        name: &'a str,
        /// Declared data size in bytes
        size: u32,
        /// Destination address of the materialized write
        address: u32,
    },

    /// DMA block write
    DmaWrite {
        /// Destination address
        address: u32,
        /// Data block
        data: &'a [u8],
    },
}

impl<'a> Record<'a> {
    /// Full encoded record: tag, length and payload.
    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.encoded
    }

    /// Encoded size including the five header bytes.
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        self.encoded.len()
    }

    /// Parse this record as a resident-data slot declaration.
    ///
    /// Returns `(name, size, address)`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedStream` if the payload is shorter than the fixed
    /// trailer, the name is not UTF-8, or the declared size cannot be
    /// materialized into a DmaWrite.
    pub fn resident_slot(&self) -> Result<(&'a str, u32, u32)> {
        let payload = self.payload;
        if payload.len() < SLOT_TRAILER_LEN {
            return Err(SequenceError::malformed(
                self.offset,
                format!(
                    "resident-data slot length {} is shorter than the {SLOT_TRAILER_LEN}-byte trailer",
                    payload.len()
                ),
            ));
        }

        let name_len = payload.len() - SLOT_TRAILER_LEN;
        let name = std::str::from_utf8(&payload[..name_len]).map_err(|e| {
            SequenceError::malformed(self.offset, format!("slot name is not UTF-8: {e}"))
        })?;
        let size = read_u32_le(payload, name_len);
        let address = read_u32_le(payload, name_len + 4);

        if size > MAX_SLOT_SIZE {
            return Err(SequenceError::malformed(
                self.offset,
                format!("slot '{name}' declares {size} bytes, more than a DmaWrite can carry"),
            ));
        }

        Ok((name, size, address))
    }

    /// Interpret the payload according to the record kind.
    ///
    /// Stricter than the store's own passes: SingleWrite must carry exactly
    /// eight bytes and DmaWrite's inner length must match the record length.
    ///
    /// # Errors
    ///
    /// Returns `MalformedStream` for inconsistent payloads and
    /// `UnsupportedRecordKind` for legacy or unknown tags.
    pub fn decode(&self) -> Result<Command<'a>> {
        match self.kind {
            RecordKind::SingleWrite => {
                if self.payload.len() != SINGLE_WRITE_PAYLOAD_LEN {
                    return Err(SequenceError::malformed(
                        self.offset,
                        format!("single write carries {} bytes, expected 8", self.payload.len()),
                    ));
                }
                Ok(Command::SingleWrite {
                    address: read_u32_le(self.payload, 0),
                    value: read_u32_le(self.payload, 4),
                })
            }
            RecordKind::ResidentDataSlot => {
                let (name, size, address) = self.resident_slot()?;
                Ok(Command::ResidentDataSlot {
                    name,
                    size,
                    address,
                })
            }
            RecordKind::DmaWrite => {
                if self.payload.len() < DMA_HEADER_LEN {
                    return Err(SequenceError::malformed(
                        self.offset,
                        format!("DMA write carries {} bytes, header needs 8", self.payload.len()),
                    ));
                }
                let address = read_u32_le(self.payload, 0);
                let data_len = read_u32_le(self.payload, 4) as usize;
                let data = &self.payload[DMA_HEADER_LEN..];
                if data.len() != data_len {
                    return Err(SequenceError::malformed(
                        self.offset,
                        format!(
                            "DMA write declares {data_len} data bytes but record holds {}",
                            data.len()
                        ),
                    ));
                }
                Ok(Command::DmaWrite { address, data })
            }
            RecordKind::LegacyBinary | RecordKind::Unknown(_) => {
                Err(SequenceError::UnsupportedRecordKind {
                    tag: self.kind.tag(),
                    offset: self.offset,
                })
            }
        }
    }
}

/// Iterator over the records of a stream
///
/// Yields each record in order. The first structural error is yielded once
/// and ends iteration.
#[derive(Debug, Clone)]
pub struct RecordReader<'a> {
    data: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> RecordReader<'a> {
    /// Walk `data` from the start.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            failed: false,
        }
    }

    fn next_record(&mut self) -> Result<Record<'a>> {
        let offset = self.pos;
        let remaining = self.data.len() - offset;

        if remaining < RECORD_HEADER_LEN {
            return Err(SequenceError::malformed(
                offset,
                format!("truncated record header ({remaining} of {RECORD_HEADER_LEN} bytes)"),
            ));
        }

        let kind = RecordKind::from(self.data[offset]);
        let length = read_u32_le(self.data, offset + 1) as usize;
        let available = remaining - RECORD_HEADER_LEN;

        if length > available {
            return Err(SequenceError::malformed(
                offset,
                format!(
                    "{} record declares {length} payload bytes but only {available} remain",
                    kind.name()
                ),
            ));
        }

        let start = offset + RECORD_HEADER_LEN;
        let end = start + length;
        self.pos = end;

        Ok(Record {
            kind,
            offset,
            payload: &self.data[start..end],
            encoded: &self.data[offset..end],
        })
    }
}

impl<'a> Iterator for RecordReader<'a> {
    type Item = Result<Record<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }

        let item = self.next_record();
        if item.is_err() {
            self.failed = true;
        }
        Some(item)
    }
}
