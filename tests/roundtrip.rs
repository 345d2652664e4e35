//! Writer round-trip and build-ID manipulation tests.

mod common;

use std::collections::HashMap;

use common::*;
use linux_perf_convert::constants::*;
use linux_perf_convert::{Endianness, EventData, PerfData};

fn sample_stream() -> Vec<u8> {
    let mut w = pipe_header(Endianness::LittleEndian);
    let attr = hardware_attr(PERF_SAMPLE_IP | PERF_SAMPLE_TID, true);
    write_attr_event(&mut w, &attr, &[]);
    write_mmap_event(&mut w, 1001, 0x1c1000, 0x1000, 0, b"/usr/lib/foo.so", None);
    write_mmap2_event(&mut w, 1001, 0x1c3000, 0x2000, 0x2000, b"/usr/lib/bar.so", None);
    write_sample_event(&mut w, 0x1c3fff, 1001, 1001, None);
    w.into_vec()
}

#[test]
fn written_file_is_a_fixed_point() {
    let data = PerfData::parse_bytes(&sample_stream()).unwrap();

    // Piped input comes out in the seekable layout, so the first write
    // changes the bytes; from then on the writer output is a fixed point.
    let once = data.to_bytes().unwrap();
    let reparsed = PerfData::parse_bytes(&once).unwrap();
    let twice = reparsed.to_bytes().unwrap();
    assert_eq!(once, twice);

    assert_eq!(reparsed.events, data.events);
    assert_eq!(reparsed.attrs.len(), data.attrs.len());
}

#[test]
fn big_endian_input_parses_identically() {
    let mut w = pipe_header(Endianness::BigEndian);
    let attr = hardware_attr(PERF_SAMPLE_IP | PERF_SAMPLE_TID, true);
    write_attr_event(&mut w, &attr, &[]);
    write_mmap_event(&mut w, 1001, 0x1c1000, 0x1000, 0, b"/usr/lib/foo.so", None);
    write_sample_event(&mut w, 0x1c1500, 1001, 1001, None);
    let be_bytes = w.into_vec();

    let data = PerfData::parse_bytes(&be_bytes).unwrap();
    assert_eq!(data.endian(), Endianness::BigEndian);
    match &data.events[0].data {
        EventData::Mmap(mmap) => {
            assert_eq!(mmap.pid, 1001);
            assert_eq!(mmap.addr, 0x1c1000);
            assert_eq!(mmap.filename, b"/usr/lib/foo.so");
        }
        other => panic!("expected MMAP, got {other:?}"),
    }
    match &data.events[1].data {
        EventData::Sample(sample) => {
            assert_eq!(sample.ip, Some(0x1c1500));
            assert_eq!(sample.pid, Some(1001));
        }
        other => panic!("expected SAMPLE, got {other:?}"),
    }

    // Writing preserves the foreign byte order and the parsed form.
    let rewritten = data.to_bytes().unwrap();
    assert_eq!(&rewritten[..8], b"2ELIFREP");
    let reparsed = PerfData::parse_bytes(&rewritten).unwrap();
    assert_eq!(reparsed.events, data.events);
}

#[test]
fn inject_build_ids_takes_misc_from_first_mmap() {
    let mut data = PerfData::parse_bytes(&sample_stream()).unwrap();
    assert!(data.build_ids.is_empty());

    let mut injections = HashMap::new();
    injections.insert(
        b"/usr/lib/foo.so".to_vec(),
        "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef".to_string(),
    );
    injections.insert(b"/not/mapped/file".to_vec(), "f00d".to_string());
    data.inject_build_ids(&injections);

    assert_eq!(
        data.build_ids.get(b"/usr/lib/foo.so"),
        Some("deadbeefdeadbeefdeadbeefdeadbeefdeadbeef")
    );
    // The injected ID is perfized to 40 hex characters.
    assert_eq!(
        data.build_ids.get(b"/not/mapped/file"),
        Some("f00d000000000000000000000000000000000000")
    );
    assert!(data.build_ids.is_injected(b"/usr/lib/foo.so"));

    let records = data.build_ids.to_records();
    let foo = records
        .iter()
        .find(|record| record.filename == b"/usr/lib/foo.so")
        .unwrap();
    assert_eq!(foo.misc & PERF_RECORD_MISC_CPUMODE_MASK, PERF_RECORD_MISC_USER);
    // No MMAP seen for this file, so it gets the kernel default.
    let unmapped = records
        .iter()
        .find(|record| record.filename == b"/not/mapped/file")
        .unwrap();
    assert_eq!(
        unmapped.misc & PERF_RECORD_MISC_CPUMODE_MASK,
        PERF_RECORD_MISC_KERNEL
    );

    // The injected entries survive a write/read cycle as a BUILD_ID
    // feature section.
    let rewritten = data.to_bytes().unwrap();
    let reparsed = PerfData::parse_bytes(&rewritten).unwrap();
    assert_eq!(
        reparsed.build_ids.get(b"/usr/lib/foo.so"),
        Some("deadbeefdeadbeefdeadbeefdeadbeefdeadbeef")
    );
}

#[test]
fn localize_by_build_id_rewrites_mmaps_and_store() {
    let mut data = PerfData::parse_bytes(&sample_stream()).unwrap();
    let mut injections = HashMap::new();
    injections.insert(b"/usr/lib/foo.so".to_vec(), "abcd0123".to_string());
    data.inject_build_ids(&injections);

    let mut localization = HashMap::new();
    localization.insert(
        linux_perf_convert::perfize_build_id("abcd0123"),
        b"/cache/abcd0123/foo.so".to_vec(),
    );
    data.localize_by_build_id(&localization);

    match &data.events[0].data {
        EventData::Mmap(mmap) => assert_eq!(mmap.filename, b"/cache/abcd0123/foo.so"),
        other => panic!("expected MMAP, got {other:?}"),
    }
    assert!(data.build_ids.get(b"/usr/lib/foo.so").is_none());
    assert_eq!(
        data.build_ids.get(b"/cache/abcd0123/foo.so"),
        Some("abcd012300000000000000000000000000000000")
    );
}

#[test]
fn localize_by_filename_and_alternates() {
    let mut data = PerfData::parse_bytes(&sample_stream()).unwrap();
    let mut injections = HashMap::new();
    injections.insert(b"/usr/lib/bar.so".to_vec(), "0123".to_string());
    data.inject_build_ids(&injections);

    let mut renames = HashMap::new();
    renames.insert(b"/usr/lib/bar.so".to_vec(), b"/chroot/usr/lib/bar.so".to_vec());
    data.localize_by_filename(&renames);

    match &data.events[1].data {
        EventData::Mmap2(mmap) => assert_eq!(mmap.filename, b"/chroot/usr/lib/bar.so"),
        other => panic!("expected MMAP2, got {other:?}"),
    }

    data.add_alternate_filenames(&[(
        b"/chroot/usr/lib/bar.so".to_vec(),
        b"/usr/lib/bar.so.alt".to_vec(),
    )]);
    assert_eq!(
        data.build_ids.get(b"/chroot/usr/lib/bar.so"),
        data.build_ids.get(b"/usr/lib/bar.so.alt"),
    );
    assert_eq!(data.build_ids.len(), 2);
}

#[test]
fn auxtrace_data_survives_round_trip() {
    let mut w = pipe_header(Endianness::LittleEndian);
    let attr = hardware_attr(PERF_SAMPLE_IP | PERF_SAMPLE_TID, true);
    write_attr_event(&mut w, &attr, &[]);
    // AUXTRACE record followed by its out-of-band trace bytes.
    w.write_u32(PERF_RECORD_AUXTRACE);
    w.write_u16(0);
    w.write_u16(8 + 40);
    w.write_u64(6); // size of trailing data
    w.write_u64(0); // offset
    w.write_u64(0x1234); // reference
    w.write_u32(0); // idx
    w.write_u32(42); // tid
    w.write_u32(1); // cpu
    w.write_u32(0); // reserved
    w.write_bytes(b"\x01\x02\x03\x04\x05\x06");
    write_sample_event(&mut w, 0x1000, 42, 42, None);
    let bytes = w.into_vec();

    let data = PerfData::parse_bytes(&bytes).unwrap();
    match &data.events[0].data {
        EventData::Auxtrace(auxtrace) => {
            assert_eq!(auxtrace.size, 6);
            assert_eq!(auxtrace.trace_data, b"\x01\x02\x03\x04\x05\x06");
        }
        other => panic!("expected AUXTRACE, got {other:?}"),
    }
    // The sample after the trace bytes still parses.
    assert!(matches!(data.events[1].data, EventData::Sample(_)));

    let rewritten = data.to_bytes().unwrap();
    let reparsed = PerfData::parse_bytes(&rewritten).unwrap();
    assert_eq!(reparsed.events, data.events);
}

#[test]
fn unknown_record_types_are_skipped() {
    let mut w = pipe_header(Endianness::LittleEndian);
    let attr = hardware_attr(PERF_SAMPLE_IP | PERF_SAMPLE_TID, true);
    write_attr_event(&mut w, &attr, &[]);
    // An unknown user-space record type.
    w.write_u32(200);
    w.write_u16(0);
    w.write_u16(16);
    w.write_u64(0xdead);
    write_sample_event(&mut w, 0x1000, 1, 1, None);
    let bytes = w.into_vec();

    let data = PerfData::parse_bytes(&bytes).unwrap();
    assert_eq!(data.events.len(), 1);
    assert!(matches!(data.events[0].data, EventData::Sample(_)));
}

#[test]
fn truncated_record_is_an_error() {
    let mut w = pipe_header(Endianness::LittleEndian);
    let attr = hardware_attr(PERF_SAMPLE_IP | PERF_SAMPLE_TID, true);
    write_attr_event(&mut w, &attr, &[]);
    // A sample whose header claims more bytes than the stream holds.
    w.write_u32(PERF_RECORD_SAMPLE);
    w.write_u16(PERF_RECORD_MISC_USER);
    w.write_u16(64);
    w.write_u64(0x1000);
    let bytes = w.into_vec();

    assert!(PerfData::parse_bytes(&bytes).is_err());
}
