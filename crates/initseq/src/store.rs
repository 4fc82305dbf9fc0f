//! Sequence store: slot catalog and output generation
//!
//! # Lifecycle
//!
//! 1. **Construct** from the raw stream. The buffer is walked once and every
//!    resident-data slot declaration lands in the catalog as `Pending`.
//! 2. **Fulfill** slots by name. Data must match the declared size exactly.
//! 3. **Generate** the output once every slot is fulfilled. Slot records are
//!    materialized into DMA writes; every other record is copied verbatim.

use crate::config::{DuplicateSlotPolicy, LegacyRecordPolicy, StoreConfig};
use crate::error::{Result, SequenceError};
use crate::record::{Record, RecordReader};
use crate::slot::ResidentSlot;
use crate::wire::{self, RecordKind};
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Original command stream plus its resident-data slot catalog
#[derive(Debug, Clone)]
pub struct SequenceStore {
    /// Source stream, retained verbatim for re-emission
    raw: Bytes,

    /// Slots in declaration order
    slots: Vec<ResidentSlot>,

    /// Slot name -> index into `slots`
    index: HashMap<String, usize>,

    config: StoreConfig,
}

impl SequenceStore {
    /// Parse a stream with the strict default configuration
    ///
    /// # Errors
    ///
    /// Returns `MalformedStream` for truncated or impossible records and
    /// `DuplicateSlot` when a slot name is declared twice.
    pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self> {
        Self::with_config(data, StoreConfig::default())
    }

    /// Parse a stream with an explicit configuration
    ///
    /// # Errors
    ///
    /// Same as [`SequenceStore::from_bytes`]; duplicates are only an error
    /// under [`DuplicateSlotPolicy::Reject`].
    pub fn with_config(data: impl Into<Bytes>, config: StoreConfig) -> Result<Self> {
        let raw = data.into();
        debug!("Parsing init sequence ({} bytes)", raw.len());

        let mut slots: Vec<ResidentSlot> = Vec::new();
        let mut index = HashMap::new();
        let mut records = 0usize;

        for record in RecordReader::new(&raw) {
            let record = record?;
            records += 1;

            if record.kind != RecordKind::ResidentDataSlot {
                continue;
            }

            let (name, size, address) = record.resident_slot()?;
            debug!(
                "Slot '{}' at offset {}: {} bytes -> 0x{:08x}",
                name, record.offset, size, address
            );
            let slot = ResidentSlot::new(name, size, address, record.offset);

            match index.get(name) {
                None => {
                    index.insert(name.to_string(), slots.len());
                    slots.push(slot);
                }
                Some(&existing) => match config.duplicate_slots {
                    DuplicateSlotPolicy::Reject => {
                        return Err(SequenceError::DuplicateSlot {
                            name: name.to_string(),
                            offset: record.offset,
                        });
                    }
                    DuplicateSlotPolicy::Overwrite => {
                        warn!(
                            "Slot '{}' redeclared at offset {} (first at {}), keeping the later declaration",
                            name,
                            record.offset,
                            slots[existing].offset()
                        );
                        slots[existing] = slot;
                    }
                },
            }
        }

        info!(
            "Init sequence parsed: {} records, {} resident-data slots",
            records,
            slots.len()
        );

        Ok(Self {
            raw,
            slots,
            index,
            config,
        })
    }

    /// Load and parse a stream file
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` / `Io` if the file cannot be read, otherwise
    /// the same errors as [`SequenceStore::from_bytes`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file_with_config(path, StoreConfig::default())
    }

    /// Load and parse a stream file with an explicit configuration
    ///
    /// # Errors
    ///
    /// See [`SequenceStore::from_file`].
    pub fn from_file_with_config<P: AsRef<Path>>(path: P, config: StoreConfig) -> Result<Self> {
        let path = path.as_ref();

        info!("Loading init sequence from: {}", path.display());

        if !path.exists() {
            return Err(SequenceError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let data = fs::read(path)?;
        Self::with_config(data, config)
    }

    /// Supply the data for one slot
    ///
    /// Calling again for an already fulfilled slot replaces its data.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSlot` if the stream never declared `name`, or
    /// `SizeMismatch` if `data` is not exactly the declared size. Neither
    /// error changes any slot.
    pub fn fulfill_slot(&mut self, name: &str, data: impl Into<Bytes>) -> Result<()> {
        let &idx = self
            .index
            .get(name)
            .ok_or_else(|| SequenceError::unknown_slot(name))?;
        let slot = &mut self.slots[idx];

        let data = data.into();
        let expected = slot.size() as usize;
        if data.len() != expected {
            return Err(SequenceError::SizeMismatch {
                name: name.to_string(),
                expected,
                actual: data.len(),
            });
        }

        if slot.is_fulfilled() {
            debug!("Replacing data for slot '{}'", name);
        } else {
            debug!("Fulfilled slot '{}' ({} bytes)", name, expected);
        }
        slot.fill(data);
        Ok(())
    }

    /// Build the output stream with every slot materialized
    ///
    /// Never returns partial output and never mutates the store.
    ///
    /// # Errors
    ///
    /// Returns `UnfulfilledSlot` naming the first pending slot in declaration
    /// order, or `UnsupportedRecordKind` for legacy (unless passed through)
    /// and unknown tags.
    pub fn generate_output_sequence(&self) -> Result<Bytes> {
        if let Some(pending) = self.slots.iter().find(|slot| !slot.is_fulfilled()) {
            return Err(SequenceError::unfulfilled(pending.name()));
        }

        let materialized: usize = self.slots.iter().map(|slot| slot.size() as usize).sum();
        let mut out = BytesMut::with_capacity(self.raw.len() + materialized);

        for record in self.records() {
            let record = record?;
            self.emit(&record, &mut out)?;
        }

        info!(
            "Generated init sequence: {} bytes ({} slots materialized)",
            out.len(),
            self.slots.len()
        );
        Ok(out.freeze())
    }

    fn emit(&self, record: &Record<'_>, out: &mut BytesMut) -> Result<()> {
        match record.kind {
            RecordKind::SingleWrite | RecordKind::DmaWrite => {
                out.put_slice(record.as_bytes());
            }
            RecordKind::ResidentDataSlot => {
                let (name, _, _) = record.resident_slot()?;
                let slot = self
                    .slot(name)
                    .ok_or_else(|| SequenceError::unknown_slot(name))?;
                let data = slot
                    .data()
                    .ok_or_else(|| SequenceError::unfulfilled(name))?;
                wire::put_dma_write(out, slot.destination_address(), data);
            }
            RecordKind::LegacyBinary if self.config.legacy_records == LegacyRecordPolicy::PassThrough => {
                warn!(
                    "Passing through legacy binary record at offset {}",
                    record.offset
                );
                out.put_slice(record.as_bytes());
            }
            RecordKind::LegacyBinary | RecordKind::Unknown(_) => {
                return Err(SequenceError::UnsupportedRecordKind {
                    tag: record.kind.tag(),
                    offset: record.offset,
                });
            }
        }
        Ok(())
    }

    /// Number of slots in the catalog
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// True if the stream declares a slot called `name`
    pub fn has_slot(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Look up a slot by name
    pub fn slot(&self, name: &str) -> Option<&ResidentSlot> {
        self.index.get(name).map(|&idx| &self.slots[idx])
    }

    /// All slots in declaration order
    pub fn slots(&self) -> impl Iterator<Item = &ResidentSlot> {
        self.slots.iter()
    }

    /// Slots still waiting for data, in declaration order
    pub fn pending_slots(&self) -> impl Iterator<Item = &ResidentSlot> {
        self.slots.iter().filter(|slot| !slot.is_fulfilled())
    }

    /// True once every slot has been fulfilled
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(ResidentSlot::is_fulfilled)
    }

    /// The original stream, unchanged
    pub fn raw_bytes(&self) -> &Bytes {
        &self.raw
    }

    /// Walk the records of the original stream
    pub fn records(&self) -> RecordReader<'_> {
        RecordReader::new(&self.raw)
    }

    /// Active configuration
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }
}
