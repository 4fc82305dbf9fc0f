#![deny(unsafe_code)]

//! Resident-data slot fulfillment for binary hardware init sequences
//!
//! An init sequence is a stream of typed, length-prefixed records: register
//! writes, DMA writes, and *resident-data slots* that only declare a name, a
//! size and a destination for data supplied later. This crate parses such a
//! stream, accepts the slot data out-of-band, and re-emits the stream with
//! each slot materialized into a DMA write. Every other record passes through
//! byte-for-byte.
//!
//! # Format
//!
//! | Tag | Record | Payload |
//! |-----|--------|---------|
//! | `0x01` | SingleWrite | `addr:u32 value:u32` |
//! | `0x02` | ResidentDataSlot | `name:u8[len-8] size:u32 addr:u32` |
//! | `0x03` | LegacyBinary | deprecated, rejected unless passed through |
//! | `0x04` | DmaWrite | `addr:u32 data_len:u32 data` |
//!
//! # Example
//!
//! ```
//! use initseq::{SequenceBuilder, SequenceStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = SequenceBuilder::new()
//!     .single_write(0x1000, 0x1234_5678)
//!     .resident_slot("weights", 4, 0x2000)?
//!     .build();
//!
//! let mut store = SequenceStore::from_bytes(stream)?;
//! println!("Slots: {}", store.slot_count());
//!
//! store.fulfill_slot("weights", vec![0xAAu8, 0xBB, 0xCC, 0xDD])?;
//! let output = store.generate_output_sequence()?;
//! assert_eq!(output.len(), 13 + 5 + 8 + 4);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod builder;
mod config;
mod error;
pub mod record;
mod slot;
mod store;
pub mod wire;

pub use builder::SequenceBuilder;
pub use config::{DuplicateSlotPolicy, LegacyRecordPolicy, StoreConfig};
pub use error::{Result, SequenceError};
pub use record::{Command, Record, RecordReader};
pub use slot::{ResidentSlot, SlotState};
pub use store::SequenceStore;
pub use wire::RecordKind;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        Result, SequenceBuilder, SequenceError, SequenceStore, SlotState, StoreConfig,
    };
}
