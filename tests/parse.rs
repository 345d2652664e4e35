//! End-to-end parser tests over synthetic piped streams.

mod common;

use common::*;
use linux_perf_convert::constants::*;
use linux_perf_convert::{
    CancelToken, Endianness, Error, EventData, ParseOptions, PerfData, PerfParser,
    serialize_profile,
};

fn options_without_threshold() -> ParseOptions {
    ParseOptions {
        sample_mapping_percentage_threshold: 0.0,
        ..ParseOptions::default()
    }
}

#[test]
fn maps_sample_event_ip() {
    let mut w = pipe_header(Endianness::LittleEndian);
    let attr = hardware_attr(PERF_SAMPLE_IP | PERF_SAMPLE_TID, true);
    write_attr_event(&mut w, &attr, &[]);
    write_mmap_event(&mut w, 1001, 0x1c1000, 0x1000, 0, b"/usr/lib/foo.so", None);
    write_mmap_event(
        &mut w,
        1001,
        0x1c3000,
        0x2000,
        0x2000,
        b"/usr/lib/bar.so",
        None,
    );
    write_sample_event(&mut w, 0x1c3fff, 1001, 1001, None);
    write_sample_event(&mut w, 0x1c2bad, 1001, 1001, None); // gap, unmapped
    let bytes = w.into_vec();

    let mut data = PerfData::parse_bytes(&bytes).unwrap();
    assert_eq!(data.attrs.len(), 1);
    assert_eq!(data.events.len(), 4);

    let mut options = options_without_threshold();
    options.do_remap = true;
    let mut parser = PerfParser::new(&mut data, options);
    parser.parse().unwrap();
    let (parsed, stats) = parser.into_parsed();

    assert_eq!(stats.num_mmap_events, 2);
    assert_eq!(stats.num_sample_events, 2);
    assert_eq!(stats.num_sample_events_mapped, 1);
    assert!(stats.did_remap);

    let resolution = parsed[2].dso_and_offset.as_ref().unwrap();
    assert_eq!(resolution.dso_name, b"/usr/lib/bar.so");
    assert_eq!(resolution.offset, 0x2fff);
    assert!(parsed[3].dso_and_offset.is_none());

    // Remap rewrote the second mapping to the dense space and the sample
    // IP along with it.
    match &data.events[1].data {
        EventData::Mmap(mmap) => {
            assert_eq!(mmap.addr, 0x1000);
            assert_eq!(mmap.len, 0x2000);
            assert_eq!(mmap.pgoff, 0x2000);
        }
        other => panic!("expected MMAP, got {other:?}"),
    }
    match &data.events[2].data {
        EventData::Sample(sample) => assert_eq!(sample.ip, Some(0x1fff)),
        other => panic!("expected SAMPLE, got {other:?}"),
    }
}

#[test]
fn kernel_mapping_covers_entire_address_space() {
    let mut w = pipe_header(Endianness::LittleEndian);
    let attr = hardware_attr(PERF_SAMPLE_IP | PERF_SAMPLE_TID, true);
    write_attr_event(&mut w, &attr, &[]);
    write_mmap_event(
        &mut w,
        KERNEL_PID,
        0,
        u64::MAX,
        0,
        b"[kernel.kallsyms]_text",
        None,
    );
    write_mmap_event(
        &mut w,
        1234,
        0x7f008e000000,
        0x2000000,
        0,
        b"/usr/lib/libfoo.so",
        None,
    );
    write_sample_event(&mut w, 0x7f008e123456, 1234, 1235, None);
    write_sample_event(&mut w, 0xffffffff8100cafe, 1234, 1235, None);
    let bytes = w.into_vec();

    let mut data = PerfData::parse_bytes(&bytes).unwrap();
    let mut options = options_without_threshold();
    options.do_remap = true;
    let mut parser = PerfParser::new(&mut data, options);
    parser.parse().unwrap();
    let (parsed, stats) = parser.into_parsed();

    assert_eq!(stats.num_mmap_events, 2);
    assert_eq!(stats.num_sample_events, 2);
    assert_eq!(stats.num_sample_events_mapped, 2);

    let library = parsed[2].dso_and_offset.as_ref().unwrap();
    assert_eq!(library.dso_name, b"/usr/lib/libfoo.so");
    assert_eq!(library.offset, 0x123456);

    // The kernel sample's offset is the raw address: the covering mapping
    // starts at zero with a zero file offset.
    let kernel = parsed[3].dso_and_offset.as_ref().unwrap();
    assert_eq!(kernel.dso_name, b"[kernel.kallsyms]_text");
    assert_eq!(kernel.offset, 0xffffffff8100cafe);

    // The remapped kernel MMAP keeps a zero file offset.
    match &data.events[0].data {
        EventData::Mmap(mmap) => assert_eq!(mmap.pgoff, 0),
        other => panic!("expected MMAP, got {other:?}"),
    }
}

#[test]
fn huge_pages_deduced_and_combined() {
    let mut w = pipe_header(Endianness::LittleEndian);
    let attr = hardware_attr(PERF_SAMPLE_IP | PERF_SAMPLE_TID, true);
    write_attr_event(&mut w, &attr, &[]);

    // A chrome binary mapped in three pieces: file-backed, anonymous huge
    // pages, file-backed again, contiguous in addresses and file offsets.
    write_mmap_event(
        &mut w,
        1234,
        0x40018000,
        0x1e8000,
        0,
        b"/opt/google/chrome/chrome",
        None,
    );
    write_mmap_event(&mut w, 1234, 0x40200000, 0x1c00000, 0, b"//anon", None);
    write_mmap_event(
        &mut w,
        1234,
        0x41e00000,
        0x4000000,
        0x1de8000,
        b"/opt/google/chrome/chrome",
        None,
    );

    // A second process whose mapping starts with the huge-page piece.
    write_mmap_event(&mut w, 2345, 0x45e00000, 0x1e00000, 0, b"//anon", None);
    write_mmap_event(
        &mut w,
        2345,
        0x47c00000,
        0x4000000,
        0x1e00000,
        b"/opt/google/chrome/chrome",
        None,
    );

    write_sample_event(&mut w, 0x40020400, 1234, 1234, None);
    write_sample_event(&mut w, 0x45e01300, 2345, 2345, None);
    let bytes = w.into_vec();

    let mut data = PerfData::parse_bytes(&bytes).unwrap();
    let mut parser = PerfParser::new(&mut data, options_without_threshold());
    parser.parse().unwrap();
    let (parsed, stats) = parser.into_parsed();

    assert_eq!(stats.num_mmap_events, 2);
    assert_eq!(stats.num_sample_events_mapped, 2);

    // Three events merged into one mapping per process.
    let mmaps: Vec<_> = data
        .events
        .iter()
        .filter_map(|event| match &event.data {
            EventData::Mmap(mmap) => Some(mmap),
            _ => None,
        })
        .collect();
    assert_eq!(mmaps.len(), 2);
    assert_eq!(mmaps[0].addr, 0x40018000);
    assert_eq!(mmaps[0].len, 0x5de8000);
    assert_eq!(mmaps[0].pgoff, 0);
    assert_eq!(mmaps[0].filename, b"/opt/google/chrome/chrome");
    assert_eq!(mmaps[1].addr, 0x45e00000);
    assert_eq!(mmaps[1].len, 0x5e00000);
    assert_eq!(mmaps[1].pgoff, 0);

    let sandwich = parsed[2].dso_and_offset.as_ref().unwrap();
    assert_eq!(sandwich.dso_name, b"/opt/google/chrome/chrome");
    assert_eq!(sandwich.offset, 0x8400);
    let leading = parsed[3].dso_and_offset.as_ref().unwrap();
    assert_eq!(leading.dso_name, b"/opt/google/chrome/chrome");
    assert_eq!(leading.offset, 0x1300);
}

#[test]
fn context_switch_cpu_wide_round_trips() {
    let mut w = pipe_header(Endianness::LittleEndian);
    let attr = hardware_attr(PERF_SAMPLE_IP | PERF_SAMPLE_TID, true);
    write_attr_event(&mut w, &attr, &[]);
    write_switch_cpu_wide(
        &mut w,
        PERF_RECORD_MISC_SWITCH_OUT,
        5656,
        5656,
        1001,
        1001,
        None,
    );
    let bytes = w.into_vec();

    let mut data = PerfData::parse_bytes(&bytes).unwrap();
    match &data.events[0].data {
        EventData::SwitchCpuWide(switch) => {
            assert_eq!(switch.next_prev_pid, 5656);
            assert_eq!(switch.next_prev_tid, 5656);
        }
        other => panic!("expected SWITCH_CPU_WIDE, got {other:?}"),
    }
    let info = data.events[0].sample_info.unwrap();
    assert_eq!(info.pid, Some(1001));
    assert_eq!(info.tid, Some(1001));

    // Byte-for-byte round trip through the writer.
    let rewritten = data.to_bytes().unwrap();
    let reparsed = PerfData::parse_bytes(&rewritten).unwrap();
    assert_eq!(reparsed.events, data.events);

    // The structured output reports the switch direction.
    let mut parser = PerfParser::new(&mut data, options_without_threshold());
    parser.parse().unwrap();
    let (parsed, stats) = parser.into_parsed();
    let profile = serialize_profile(&data, &parsed, &stats);
    match profile.events[0].event.as_ref().unwrap() {
        linux_perf_convert::proto::PerfEventTypedProto::ContextSwitchEvent(switch) => {
            assert!(switch.is_out);
            assert_eq!(switch.next_prev_pid, Some(5656));
        }
        other => panic!("expected context switch proto, got {other:?}"),
    }
}

#[test]
fn events_sorted_by_time_and_rounds_dropped() {
    let mut w = pipe_header(Endianness::LittleEndian);
    let attr = hardware_attr(PERF_SAMPLE_IP | PERF_SAMPLE_TID | PERF_SAMPLE_TIME, true);
    write_attr_event(&mut w, &attr, &[]);
    write_mmap_event(&mut w, 1001, 0x1000, 0x1000, 0, b"/bin/a", Some(1000));
    write_sample_event(&mut w, 0x1500, 1001, 1001, Some(12300020));
    write_sample_event(&mut w, 0x1504, 1001, 1001, Some(12300010));
    write_finished_round(&mut w);
    write_sample_event(&mut w, 0x1508, 1001, 1001, Some(12300040));
    write_sample_event(&mut w, 0x150c, 1001, 1001, Some(12300030));
    write_finished_round(&mut w);
    let bytes = w.into_vec();

    let mut data = PerfData::parse_bytes(&bytes).unwrap();
    assert_eq!(data.events.len(), 7);

    let mut parser = PerfParser::new(&mut data, options_without_threshold());
    parser.parse().unwrap();
    let _ = parser.into_parsed();

    // FINISHED_ROUND records disappear from the output sequence.
    assert_eq!(data.events.len(), 5);
    let times: Vec<_> = data
        .events
        .iter()
        .filter_map(|event| event.timestamp())
        .collect();
    for pair in times.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
}

#[test]
fn unsortable_events_left_in_wire_order() {
    // Without PERF_SAMPLE_TIME the chronological sort is silently skipped.
    let mut w = pipe_header(Endianness::LittleEndian);
    let attr = hardware_attr(PERF_SAMPLE_IP | PERF_SAMPLE_TID, true);
    write_attr_event(&mut w, &attr, &[]);
    write_sample_event(&mut w, 0x2000, 1, 1, None);
    write_sample_event(&mut w, 0x1000, 1, 1, None);
    let bytes = w.into_vec();

    let mut data = PerfData::parse_bytes(&bytes).unwrap();
    let mut parser = PerfParser::new(&mut data, options_without_threshold());
    parser.parse().unwrap();
    let _ = parser.into_parsed();

    let ips: Vec<_> = data
        .events
        .iter()
        .filter_map(|event| match &event.data {
            EventData::Sample(sample) => sample.ip,
            _ => None,
        })
        .collect();
    assert_eq!(ips, vec![0x2000, 0x1000]);
}

#[test]
fn mapping_threshold_rejects_mostly_unmapped_files() {
    let mut w = pipe_header(Endianness::LittleEndian);
    let attr = hardware_attr(PERF_SAMPLE_IP | PERF_SAMPLE_TID, true);
    write_attr_event(&mut w, &attr, &[]);
    write_mmap_event(&mut w, 1001, 0x1000, 0x1000, 0, b"/bin/a", None);
    write_sample_event(&mut w, 0x1800, 1001, 1001, None); // mapped
    write_sample_event(&mut w, 0x9800, 1001, 1001, None); // unmapped
    let bytes = w.into_vec();

    let mut data = PerfData::parse_bytes(&bytes).unwrap();
    let mut parser = PerfParser::new(&mut data, ParseOptions::default());
    let err = parser.parse().unwrap_err();
    assert!(matches!(err, Error::InsufficientlyMapped { mapped: 1, total: 2, .. }));
}

#[test]
fn remap_twice_is_stable() {
    let mut w = pipe_header(Endianness::LittleEndian);
    let attr = hardware_attr(PERF_SAMPLE_IP | PERF_SAMPLE_TID, true);
    write_attr_event(&mut w, &attr, &[]);
    write_mmap_event(&mut w, 1001, 0x1c1000, 0x1000, 0, b"/usr/lib/foo.so", None);
    write_mmap_event(
        &mut w,
        1001,
        0x1c3000,
        0x2000,
        0x2000,
        b"/usr/lib/bar.so",
        None,
    );
    write_sample_event(&mut w, 0x1c3fff, 1001, 1001, None);
    let bytes = w.into_vec();

    let mut data = PerfData::parse_bytes(&bytes).unwrap();
    let mut options = options_without_threshold();
    options.do_remap = true;
    let first_stats;
    {
        let mut parser = PerfParser::new(&mut data, options.clone());
        parser.parse().unwrap();
        first_stats = *parser.stats();
    }
    let first_pass = data.to_bytes().unwrap();

    // Remapping the remapped file again, with mapping combining disabled,
    // must not move anything.
    let mut data2 = PerfData::parse_bytes(&first_pass).unwrap();
    options.combine_mappings = false;
    let second_stats;
    {
        let mut parser = PerfParser::new(&mut data2, options);
        parser.parse().unwrap();
        second_stats = *parser.stats();
    }
    let second_pass = data2.to_bytes().unwrap();

    assert_eq!(first_stats.num_sample_events, second_stats.num_sample_events);
    assert_eq!(first_stats.num_mmap_events, second_stats.num_mmap_events);
    assert_eq!(
        first_stats.num_sample_events_mapped,
        second_stats.num_sample_events_mapped
    );
    assert_eq!(first_pass, second_pass);
}

#[test]
fn cancellation_stops_the_walk() {
    let mut w = pipe_header(Endianness::LittleEndian);
    let attr = hardware_attr(PERF_SAMPLE_IP | PERF_SAMPLE_TID, true);
    write_attr_event(&mut w, &attr, &[]);
    write_sample_event(&mut w, 0x1000, 1, 1, None);
    let bytes = w.into_vec();

    let mut data = PerfData::parse_bytes(&bytes).unwrap();
    let token = CancelToken::new();
    token.cancel();
    let mut parser = PerfParser::new(&mut data, options_without_threshold());
    parser.set_cancel_token(token);
    assert!(matches!(parser.parse(), Err(Error::Cancelled)));
}

#[test]
fn mmap2_inode_info_is_parsed() {
    let mut w = pipe_header(Endianness::LittleEndian);
    let attr = hardware_attr(PERF_SAMPLE_IP | PERF_SAMPLE_TID, true);
    write_attr_event(&mut w, &attr, &[]);
    write_mmap2_event(&mut w, 1002, 0x2c1000, 0x2000, 0, b"/usr/lib/baz.so", None);
    write_sample_event(&mut w, 0x2c100a, 1002, 1002, None);
    let bytes = w.into_vec();

    let mut data = PerfData::parse_bytes(&bytes).unwrap();
    match &data.events[0].data {
        EventData::Mmap2(mmap) => match &mmap.file_id {
            linux_perf_convert::Mmap2FileId::InodeAndVersion { maj, min, ino, .. } => {
                assert_eq!((*maj, *min, *ino), (6, 6, 8));
            }
            other => panic!("expected inode info, got {other:?}"),
        },
        other => panic!("expected MMAP2, got {other:?}"),
    }

    let mut parser = PerfParser::new(&mut data, options_without_threshold());
    parser.parse().unwrap();
    let (parsed, _stats) = parser.into_parsed();
    let resolution = parsed[1].dso_and_offset.as_ref().unwrap();
    assert_eq!(resolution.dso_name, b"/usr/lib/baz.so");
    assert_eq!(resolution.offset, 0xa);
}
