//! Wire format of the init command stream.
//!
//! Every record is a one-byte tag, a little-endian `u32` payload length and
//! exactly that many payload bytes. All integers are little-endian and
//! unsigned.
//!
//! ```text
//! Record := tag:u8 length:u32 payload:u8[length]
//!
//! 0x01 SingleWrite       payload := dest_addr:u32 data:u32          (length 8)
//! 0x02 ResidentDataSlot  payload := name:u8[length-8] size:u32 dest_addr:u32
//! 0x03 LegacyBinary      deprecated, no decode rule
//! 0x04 DmaWrite          payload := dest_addr:u32 data_len:u32 data:u8[data_len]
//! ```

use bytes::BufMut;

// ── Tags ─────────────────────────────────────────────────────────────────────

/// Single APB register write.
pub const TAG_SINGLE_WRITE: u8 = 0x01;

/// Resident-data slot declaration.
pub const TAG_RESIDENT_DATA_SLOT: u8 = 0x02;

/// Program-memory binary. Deprecated; occupies the tag but has no layout.
pub const TAG_LEGACY_BINARY: u8 = 0x03;

/// DMA block write.
pub const TAG_DMA_WRITE: u8 = 0x04;

// ── Layout ───────────────────────────────────────────────────────────────────

/// Tag byte plus `u32` length.
pub const RECORD_HEADER_LEN: usize = 5;

/// Payload length of a SingleWrite record.
pub const SINGLE_WRITE_PAYLOAD_LEN: usize = 8;

/// Fixed trailer of a slot payload (`size` + `dest_addr`).
pub const SLOT_TRAILER_LEN: usize = 8;

/// Fixed header of a DMA payload (`dest_addr` + `data_len`).
pub const DMA_HEADER_LEN: usize = 8;

/// Largest slot size whose materialized DmaWrite length still fits a `u32`.
pub const MAX_SLOT_SIZE: u32 = u32::MAX - DMA_HEADER_LEN as u32;

/// Record kind, decoded from the tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// `0x01`
    SingleWrite,
    /// `0x02`
    ResidentDataSlot,
    /// `0x03`
    LegacyBinary,
    /// `0x04`
    DmaWrite,
    /// Any tag outside the defined space
    Unknown(u8),
}

impl RecordKind {
    /// Raw tag byte for this kind.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::SingleWrite => TAG_SINGLE_WRITE,
            Self::ResidentDataSlot => TAG_RESIDENT_DATA_SLOT,
            Self::LegacyBinary => TAG_LEGACY_BINARY,
            Self::DmaWrite => TAG_DMA_WRITE,
            Self::Unknown(tag) => tag,
        }
    }

    /// Human-readable name, used by logs and the CLI.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SingleWrite => "SingleWrite",
            Self::ResidentDataSlot => "ResidentDataSlot",
            Self::LegacyBinary => "LegacyBinary",
            Self::DmaWrite => "DmaWrite",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl From<u8> for RecordKind {
    fn from(tag: u8) -> Self {
        match tag {
            TAG_SINGLE_WRITE => Self::SingleWrite,
            TAG_RESIDENT_DATA_SLOT => Self::ResidentDataSlot,
            TAG_LEGACY_BINARY => Self::LegacyBinary,
            TAG_DMA_WRITE => Self::DmaWrite,
            other => Self::Unknown(other),
        }
    }
}

/// Read a little-endian `u32` at `pos`. Callers guarantee four bytes remain.
pub(crate) fn read_u32_le(data: &[u8], pos: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&data[pos..pos + 4]);
    u32::from_le_bytes(word)
}

/// Append a DmaWrite record carrying `data` for `address`.
///
/// Callers guarantee `data.len() + DMA_HEADER_LEN` fits a `u32`.
pub(crate) fn put_dma_write(out: &mut impl BufMut, address: u32, data: &[u8]) {
    #[allow(clippy::cast_possible_truncation)]
    let data_len = data.len() as u32;
    out.put_u8(TAG_DMA_WRITE);
    out.put_u32_le(data_len + DMA_HEADER_LEN as u32);
    out.put_u32_le(address);
    out.put_u32_le(data_len);
    out.put_slice(data);
}
