//! Sequence builder
//!
//! Encodes register writes, slot declarations and DMA blocks into a command
//! stream that [`SequenceStore`](crate::SequenceStore) can consume.

use crate::error::{Result, SequenceError};
use crate::wire::{
    self, TAG_RESIDENT_DATA_SLOT, TAG_SINGLE_WRITE, DMA_HEADER_LEN, SINGLE_WRITE_PAYLOAD_LEN,
    SLOT_TRAILER_LEN,
};
use bytes::{BufMut, Bytes, BytesMut};

/// Incremental encoder for init command streams
#[derive(Debug, Default, Clone)]
pub struct SequenceBuilder {
    buf: BytesMut,
    records: usize,
}

/// `u32` length for a payload of `len` bytes
fn length_field(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| SequenceError::PayloadTooLarge { len })
}

impl SequenceBuilder {
    /// Empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single register write
    #[must_use]
    pub fn single_write(mut self, address: u32, value: u32) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let length = SINGLE_WRITE_PAYLOAD_LEN as u32;
        self.buf.put_u8(TAG_SINGLE_WRITE);
        self.buf.put_u32_le(length);
        self.buf.put_u32_le(address);
        self.buf.put_u32_le(value);
        self.records += 1;
        self
    }

    /// Append a resident-data slot declaration
    ///
    /// # Errors
    ///
    /// Returns `PayloadTooLarge` if the name does not fit a `u32` length.
    pub fn resident_slot(mut self, name: &str, size: u32, address: u32) -> Result<Self> {
        let length = length_field(name.len() + SLOT_TRAILER_LEN)?;
        self.buf.put_u8(TAG_RESIDENT_DATA_SLOT);
        self.buf.put_u32_le(length);
        self.buf.put_slice(name.as_bytes());
        self.buf.put_u32_le(size);
        self.buf.put_u32_le(address);
        self.records += 1;
        Ok(self)
    }

    /// Append a DMA write of `data` to `address`
    ///
    /// # Errors
    ///
    /// Returns `PayloadTooLarge` if the record length does not fit a `u32`.
    pub fn dma_write(mut self, address: u32, data: &[u8]) -> Result<Self> {
        length_field(data.len() + DMA_HEADER_LEN)?;
        wire::put_dma_write(&mut self.buf, address, data);
        self.records += 1;
        Ok(self)
    }

    /// Append one DMA write of `data` per destination address
    ///
    /// Program-memory images shared by several cores are replicated this way.
    ///
    /// # Errors
    ///
    /// See [`SequenceBuilder::dma_write`].
    pub fn dma_broadcast(mut self, data: &[u8], addresses: &[u32]) -> Result<Self> {
        for &address in addresses {
            self = self.dma_write(address, data)?;
        }
        Ok(self)
    }

    /// Append a record with an arbitrary tag and opaque payload
    ///
    /// # Errors
    ///
    /// Returns `PayloadTooLarge` if the payload does not fit a `u32` length.
    pub fn raw_record(mut self, tag: u8, payload: &[u8]) -> Result<Self> {
        let length = length_field(payload.len())?;
        self.buf.put_u8(tag);
        self.buf.put_u32_le(length);
        self.buf.put_slice(payload);
        self.records += 1;
        Ok(self)
    }

    /// Records appended so far
    pub const fn record_count(&self) -> usize {
        self.records
    }

    /// Finish and return the encoded stream
    pub fn build(self) -> Bytes {
        tracing::debug!(
            "Built init sequence: {} records, {} bytes",
            self.records,
            self.buf.len()
        );
        self.buf.freeze()
    }
}
