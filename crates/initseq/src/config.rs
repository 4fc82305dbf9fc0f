//! Store configuration
//!
//! Both policies default to the strict choice; relaxing either one is an
//! explicit opt-in by the caller.

/// What to do when a slot name is declared twice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateSlotPolicy {
    /// Fail construction with `DuplicateSlot`
    #[default]
    Reject,

    /// Later declaration replaces the earlier one (logged at `warn`)
    Overwrite,
}

/// What generation does with deprecated `LegacyBinary` records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LegacyRecordPolicy {
    /// Fail generation with `UnsupportedRecordKind`
    #[default]
    Reject,

    /// Copy the record to the output unchanged
    PassThrough,
}

/// Sequence store configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Duplicate slot handling during construction
    pub duplicate_slots: DuplicateSlotPolicy,

    /// Legacy record handling during generation
    pub legacy_records: LegacyRecordPolicy,
}

impl StoreConfig {
    /// Strict configuration (same as `Default`)
    #[must_use]
    pub fn strict() -> Self {
        Self::default()
    }

    /// Set the duplicate slot policy
    #[must_use]
    pub const fn with_duplicate_slots(mut self, policy: DuplicateSlotPolicy) -> Self {
        self.duplicate_slots = policy;
        self
    }

    /// Set the legacy record policy
    #[must_use]
    pub const fn with_legacy_records(mut self, policy: LegacyRecordPolicy) -> Self {
        self.legacy_records = policy;
        self
    }
}
