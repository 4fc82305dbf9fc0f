//! End-to-end tests for parse, fulfill and generate
//!
//! Streams are built with `SequenceBuilder` except where a test needs bytes
//! the builder refuses to produce.

use initseq::{
    Command, LegacyRecordPolicy, RecordKind, SequenceBuilder, SequenceError, SequenceStore,
    SlotState, StoreConfig,
};

const LEGACY_TAG: u8 = 0x03;

fn counting(len: u8) -> Vec<u8> {
    (0..len).collect()
}

/// APB write, slot "test_vrd" (16 bytes @ 0x2000), DMA write
fn reference_stream() -> Vec<u8> {
    SequenceBuilder::new()
        .single_write(0x1000, 0x1234_5678)
        .resident_slot("test_vrd", 16, 0x2000)
        .expect("slot")
        .dma_write(0x3000, &[0xAA, 0xBB, 0xCC, 0xDD])
        .expect("dma")
        .build()
        .to_vec()
}

#[test]
fn test_empty_stream() {
    let store = SequenceStore::from_bytes(Vec::<u8>::new()).expect("empty stream parses");
    assert_eq!(store.slot_count(), 0);
    assert!(store.is_complete());
    assert!(store.generate_output_sequence().expect("generate").is_empty());
}

#[test]
fn test_identity_without_slots() {
    let input = SequenceBuilder::new()
        .single_write(0x1000, 0x1234_5678)
        .dma_write(0x3000, &[1, 2, 3, 4, 5])
        .expect("dma")
        .single_write(0x1004, 0)
        .dma_write(0x4000, &[])
        .expect("dma")
        .build();

    let store = SequenceStore::from_bytes(input.clone()).expect("parse");
    assert_eq!(store.slot_count(), 0);
    assert_eq!(store.generate_output_sequence().expect("generate"), input);
}

#[test]
fn test_round_trip_materializes_slot() {
    let input = SequenceBuilder::new()
        .resident_slot("x", 16, 0x2000)
        .expect("slot")
        .build();

    let mut store = SequenceStore::from_bytes(input).expect("parse");
    store.fulfill_slot("x", counting(16)).expect("fulfill");

    let out = store.generate_output_sequence().expect("generate");

    let mut expected = vec![0x04, 24, 0, 0, 0, 0x00, 0x20, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00];
    expected.extend(counting(16));
    assert_eq!(&out[..], &expected[..]);
}

#[test]
fn test_reference_stream_output() {
    let input = reference_stream();
    let mut store = SequenceStore::from_bytes(input.clone()).expect("parse");
    store.fulfill_slot("test_vrd", counting(16)).expect("fulfill");

    let out = store.generate_output_sequence().expect("generate");

    // APB write untouched
    assert_eq!(&out[..13], &input[..13]);
    // trailing DMA write untouched
    assert_eq!(&out[out.len() - 17..], &input[input.len() - 17..]);

    let records: Vec<_> = initseq::RecordReader::new(&out)
        .collect::<initseq::Result<_>>()
        .expect("output is a valid stream");
    let kinds: Vec<_> = records.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        [RecordKind::SingleWrite, RecordKind::DmaWrite, RecordKind::DmaWrite]
    );

    let data = counting(16);
    assert_eq!(
        records[1].decode().expect("decode"),
        Command::DmaWrite {
            address: 0x2000,
            data: &data
        }
    );
}

#[test]
fn test_single_write_survives_slot_processing() {
    let apb = [0x01, 0x08, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x78, 0x56, 0x34, 0x12];
    let input = SequenceBuilder::new()
        .resident_slot("a", 2, 0x10)
        .expect("slot")
        .raw_record(0x01, &apb[5..])
        .expect("raw")
        .resident_slot("b", 3, 0x20)
        .expect("slot")
        .build();

    let mut store = SequenceStore::from_bytes(input).expect("parse");
    store.fulfill_slot("a", vec![1u8, 2]).expect("fulfill a");
    store.fulfill_slot("b", vec![3u8, 4, 5]).expect("fulfill b");

    let out = store.generate_output_sequence().expect("generate");
    let start = 5 + 8 + 2;
    assert_eq!(&out[start..start + 13], &apb);
}

#[test]
fn test_size_mismatch_keeps_pending() {
    let mut store = SequenceStore::from_bytes(reference_stream()).expect("parse");

    for len in [0u8, 15, 17] {
        let err = store
            .fulfill_slot("test_vrd", counting(len))
            .expect_err("wrong size must fail");
        match err {
            SequenceError::SizeMismatch {
                name,
                expected,
                actual,
            } => {
                assert_eq!(name, "test_vrd");
                assert_eq!(expected, 16);
                assert_eq!(actual, usize::from(len));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.slot("test_vrd").expect("slot").state(), &SlotState::Pending);
    }
}

#[test]
fn test_size_mismatch_keeps_previous_data() {
    let mut store = SequenceStore::from_bytes(reference_stream()).expect("parse");
    store.fulfill_slot("test_vrd", vec![7u8; 16]).expect("fulfill");
    assert!(store.fulfill_slot("test_vrd", vec![9u8; 4]).is_err());

    let slot = store.slot("test_vrd").expect("slot");
    assert_eq!(slot.data().map(|d| d.to_vec()), Some(vec![7u8; 16]));
}

#[test]
fn test_refulfill_replaces_data() {
    let mut store = SequenceStore::from_bytes(reference_stream()).expect("parse");
    store.fulfill_slot("test_vrd", vec![1u8; 16]).expect("first");
    store.fulfill_slot("test_vrd", vec![2u8; 16]).expect("second");

    let out = store.generate_output_sequence().expect("generate");
    assert_eq!(&out[26..42], &[2u8; 16]);
}

#[test]
fn test_unknown_slot_changes_nothing() {
    let mut store = SequenceStore::from_bytes(reference_stream()).expect("parse");
    store.fulfill_slot("test_vrd", counting(16)).expect("fulfill");
    let before = store.slot("test_vrd").cloned();

    let err = store
        .fulfill_slot("missing", counting(16))
        .expect_err("unknown name");
    assert!(matches!(err, SequenceError::UnknownSlot { ref name } if name == "missing"));
    assert_eq!(store.slot("test_vrd").cloned(), before);
    assert!(!store.has_slot("missing"));
}

#[test]
fn test_unfulfilled_iff_pending() {
    let input = SequenceBuilder::new()
        .resident_slot("first", 1, 0)
        .expect("slot")
        .resident_slot("second", 1, 4)
        .expect("slot")
        .build();
    let mut store = SequenceStore::from_bytes(input).expect("parse");

    assert!(matches!(
        store.generate_output_sequence(),
        Err(SequenceError::UnfulfilledSlot { name }) if name == "first"
    ));

    store.fulfill_slot("first", vec![0u8]).expect("fulfill");
    assert!(matches!(
        store.generate_output_sequence(),
        Err(SequenceError::UnfulfilledSlot { name }) if name == "second"
    ));
    let pending: Vec<_> = store.pending_slots().map(|s| s.name().to_string()).collect();
    assert_eq!(pending, ["second"]);

    store.fulfill_slot("second", vec![0u8]).expect("fulfill");
    assert!(store.is_complete());
    assert!(store.generate_output_sequence().is_ok());
}

#[test]
fn test_truncated_payload_is_malformed() {
    let input = reference_stream();
    for cut in [1, 4, 12, 20, input.len() - 1] {
        let result = SequenceStore::from_bytes(input[..cut].to_vec());
        assert!(
            matches!(result, Err(SequenceError::MalformedStream { .. })),
            "cut at {cut} should be malformed"
        );
    }
}

#[test]
fn test_slot_shorter_than_trailer() {
    let input = SequenceBuilder::new()
        .raw_record(0x02, &[0, 0, 0, 0])
        .expect("raw")
        .build();
    assert!(matches!(
        SequenceStore::from_bytes(input),
        Err(SequenceError::MalformedStream { offset: 0, .. })
    ));
}

#[test]
fn test_legacy_record_rejected_by_default() {
    let input = SequenceBuilder::new()
        .single_write(0, 0)
        .raw_record(LEGACY_TAG, &[1, 2, 3])
        .expect("raw")
        .build();

    // parsing skips it, generation refuses it
    let store = SequenceStore::from_bytes(input).expect("parse");
    assert!(matches!(
        store.generate_output_sequence(),
        Err(SequenceError::UnsupportedRecordKind { tag: 3, offset: 13 })
    ));
}

#[test]
fn test_legacy_record_pass_through() {
    let input = SequenceBuilder::new()
        .raw_record(LEGACY_TAG, &[1, 2, 3])
        .expect("raw")
        .build();
    let config = StoreConfig::default().with_legacy_records(LegacyRecordPolicy::PassThrough);

    let store = SequenceStore::with_config(input.clone(), config).expect("parse");
    assert_eq!(store.generate_output_sequence().expect("generate"), input);
}

#[test]
fn test_unknown_tag_unsupported_even_with_pass_through() {
    let input = SequenceBuilder::new()
        .raw_record(0x7f, &[])
        .expect("raw")
        .build();
    let config = StoreConfig::default().with_legacy_records(LegacyRecordPolicy::PassThrough);

    let store = SequenceStore::with_config(input, config).expect("parse");
    assert!(matches!(
        store.generate_output_sequence(),
        Err(SequenceError::UnsupportedRecordKind { tag: 0x7f, offset: 0 })
    ));
}

#[test]
fn test_duplicate_slot_surfaced() {
    let input = SequenceBuilder::new()
        .resident_slot("dup", 4, 0)
        .expect("slot")
        .resident_slot("dup", 8, 0x100)
        .expect("slot")
        .build();

    match SequenceStore::from_bytes(input) {
        Err(SequenceError::DuplicateSlot { name, offset }) => {
            assert_eq!(name, "dup");
            assert_eq!(offset, 5 + 3 + 8);
        }
        other => panic!("expected DuplicateSlot, got {other:?}"),
    }
}

#[test]
fn test_generation_does_not_mutate() {
    let mut store = SequenceStore::from_bytes(reference_stream()).expect("parse");
    store.fulfill_slot("test_vrd", counting(16)).expect("fulfill");

    let first = store.generate_output_sequence().expect("first");
    let second = store.generate_output_sequence().expect("second");
    assert_eq!(first, second);
    assert_eq!(&store.raw_bytes()[..], &reference_stream()[..]);
}

#[test]
fn test_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sample_sequence.bin");
    std::fs::write(&path, reference_stream()).expect("write");

    let store = SequenceStore::from_file(&path).expect("load");
    assert_eq!(store.slot_count(), 1);
    assert!(store.has_slot("test_vrd"));

    let missing = dir.path().join("missing.bin");
    assert!(matches!(
        SequenceStore::from_file(&missing),
        Err(SequenceError::FileNotFound { .. })
    ));
}
