//! Error types for init-sequence operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for init-sequence operations
pub type Result<T> = std::result::Result<T, SequenceError>;

/// Errors that can occur while parsing, fulfilling or generating a sequence
#[derive(Debug, Error)]
pub enum SequenceError {
    /// Structural decode failure in the record stream
    #[error("Malformed stream at offset {offset}: {reason}")]
    MalformedStream {
        /// Byte offset of the offending record's tag
        offset: usize,
        /// Reason for failure
        reason: String,
    },

    /// A resident-data slot name was declared more than once
    #[error("Duplicate resident-data slot '{name}' at offset {offset}")]
    DuplicateSlot {
        /// Slot name
        name: String,
        /// Byte offset of the second declaration
        offset: usize,
    },

    /// Fulfillment referenced a slot that the stream never declared
    #[error("Unknown resident-data slot: {name}")]
    UnknownSlot {
        /// Requested slot name
        name: String,
    },

    /// Fulfillment data length disagrees with the declared slot size
    #[error("Resident-data size mismatch for {name}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Slot name
        name: String,
        /// Declared size
        expected: usize,
        /// Length of the supplied data
        actual: usize,
    },

    /// Generation was attempted while a slot is still pending
    #[error("Resident-data slot not fulfilled: {name}")]
    UnfulfilledSlot {
        /// First pending slot in declaration order
        name: String,
    },

    /// Record tag with no emission rule
    #[error("Unsupported record kind 0x{tag:02x} at offset {offset}")]
    UnsupportedRecordKind {
        /// Raw tag byte
        tag: u8,
        /// Byte offset of the record
        offset: usize,
    },

    /// Payload cannot be described by a 32-bit length field
    #[error("Payload of {len} bytes does not fit a u32 length field")]
    PayloadTooLarge {
        /// Payload length in bytes
        len: usize,
    },

    /// Sequence file not found
    #[error("Sequence file not found: {path}")]
    FileNotFound {
        /// Path that was attempted
        path: PathBuf,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

impl SequenceError {
    /// Create a malformed stream error
    pub fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedStream {
            offset,
            reason: reason.into(),
        }
    }

    /// Create an unknown slot error
    pub fn unknown_slot(name: impl Into<String>) -> Self {
        Self::UnknownSlot { name: name.into() }
    }

    /// Create an unfulfilled slot error
    pub fn unfulfilled(name: impl Into<String>) -> Self {
        Self::UnfulfilledSlot { name: name.into() }
    }
}
