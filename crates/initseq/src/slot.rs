//! Resident-data slots
//!
//! A slot is declared by the stream with a name, a size and a destination
//! address. Its data arrives later through fulfillment.

use bytes::Bytes;

/// Fulfillment state of a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    /// Declared, no data yet
    Pending,

    /// Data supplied; length always equals the declared size
    Fulfilled(Bytes),
}

/// Resident-data slot extracted from the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidentSlot {
    name: String,
    size: u32,
    destination_address: u32,
    offset: usize,
    state: SlotState,
}

impl ResidentSlot {
    pub(crate) fn new(name: impl Into<String>, size: u32, destination_address: u32, offset: usize) -> Self {
        Self {
            name: name.into(),
            size,
            destination_address,
            offset,
            state: SlotState::Pending,
        }
    }

    /// Slot name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared data size in bytes
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Target address of the materialized DMA write
    pub const fn destination_address(&self) -> u32 {
        self.destination_address
    }

    /// Stream offset of the declaring record
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Current state
    pub const fn state(&self) -> &SlotState {
        &self.state
    }

    /// True once data has been supplied
    pub const fn is_fulfilled(&self) -> bool {
        matches!(self.state, SlotState::Fulfilled(_))
    }

    /// Fulfilled data, if any
    pub fn data(&self) -> Option<&Bytes> {
        match &self.state {
            SlotState::Fulfilled(data) => Some(data),
            SlotState::Pending => None,
        }
    }

    /// Store data. Length has already been checked against `size`.
    pub(crate) fn fill(&mut self, data: Bytes) {
        debug_assert_eq!(data.len(), self.size as usize);
        self.state = SlotState::Fulfilled(data);
    }
}
