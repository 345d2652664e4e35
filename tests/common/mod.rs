//! Builders that assemble synthetic perf.data streams in memory, in the
//! piped layout (no seeking, attributes delivered inline).
#![allow(dead_code)]

use linux_perf_convert::constants::*;
use linux_perf_convert::{ByteWriter, Endianness, EventAttr};

pub const ATTR_SIZE: usize = 128;

/// Start a piped stream: magic plus the 16-byte header size.
pub fn pipe_header(endian: Endianness) -> ByteWriter {
    let mut w = ByteWriter::new(endian);
    match endian {
        Endianness::LittleEndian => w.write_bytes(b"PERFILE2"),
        Endianness::BigEndian => w.write_bytes(b"2ELIFREP"),
    }
    w.write_u64(16);
    w
}

/// A hardware-counter attribute with the given sample format.
pub fn hardware_attr(sample_type: u64, sample_id_all: bool) -> EventAttr {
    let mut flags = ATTR_FLAG_BIT_MMAP | ATTR_FLAG_BIT_COMM;
    if sample_id_all {
        flags |= ATTR_FLAG_BIT_SAMPLE_ID_ALL;
    }
    EventAttr {
        type_: 0, // PERF_TYPE_HARDWARE
        size: ATTR_SIZE as u32,
        config: 0, // PERF_COUNT_HW_CPU_CYCLES
        sample_period_or_freq: 100_000,
        sample_format: linux_perf_convert::SampleFormat::from_bits_retain(sample_type),
        read_format: linux_perf_convert::ReadFormat::empty(),
        flags: linux_perf_convert::AttrFlags::from_bits_retain(flags),
        wakeup_events_or_watermark: 0,
        bp_type: linux_perf_convert::HwBreakpointType::empty(),
        bp_addr_or_config1: 0,
        bp_len_or_config2: 0,
        branch_sample_format: linux_perf_convert::BranchSampleFormat::empty(),
        sample_regs_user: 0,
        sample_stack_user: 0,
        clockid: 0,
        sample_regs_intr: 0,
        aux_watermark: 0,
        sample_max_stack: 0,
        aux_sample_size: 0,
        sig_data: 0,
    }
}

/// PERF_RECORD_HEADER_ATTR: attr plus its event IDs.
pub fn write_attr_event(w: &mut ByteWriter, attr: &EventAttr, ids: &[u64]) {
    let size = 8 + ATTR_SIZE + ids.len() * 8;
    w.write_u32(PERF_RECORD_HEADER_ATTR);
    w.write_u16(0);
    w.write_u16(size as u16);
    attr.write(w);
    for id in ids {
        w.write_u64(*id);
    }
}

/// The sample-info trailer used by our synthetic kernel records: pid/tid,
/// plus a timestamp when the attribute samples TIME.
fn write_trailer(w: &mut ByteWriter, pid: u32, tid: u32, time: Option<u64>) {
    w.write_u32(pid);
    w.write_u32(tid);
    if let Some(time) = time {
        w.write_u64(time);
    }
}

fn trailer_size(time: Option<u64>) -> usize {
    8 + if time.is_some() { 8 } else { 0 }
}

fn padded_len(s: &[u8]) -> usize {
    (s.len() + 1 + 7) & !7
}

/// PERF_RECORD_MMAP. The trailer shape must match the attribute written
/// into the stream: pass `time` iff the attribute samples TIME.
pub fn write_mmap_event(
    w: &mut ByteWriter,
    pid: u32,
    start: u64,
    len: u64,
    pgoff: u64,
    filename: &[u8],
    time: Option<u64>,
) {
    let misc = if pid == KERNEL_PID {
        PERF_RECORD_MISC_KERNEL
    } else {
        PERF_RECORD_MISC_USER
    };
    let name_len = padded_len(filename);
    let size = 8 + 32 + name_len + trailer_size(time);
    w.write_u32(PERF_RECORD_MMAP);
    w.write_u16(misc);
    w.write_u16(size as u16);
    w.write_u32(pid);
    w.write_u32(pid);
    w.write_u64(start);
    w.write_u64(len);
    w.write_u64(pgoff);
    w.write_bytes(filename);
    for _ in filename.len()..name_len {
        w.write_u8(0);
    }
    write_trailer(w, pid, pid, time);
}

/// PERF_RECORD_MMAP2 carrying inode identification.
pub fn write_mmap2_event(
    w: &mut ByteWriter,
    pid: u32,
    start: u64,
    len: u64,
    pgoff: u64,
    filename: &[u8],
    time: Option<u64>,
) {
    let name_len = padded_len(filename);
    let size = 8 + 32 + 24 + 8 + name_len + trailer_size(time);
    w.write_u32(PERF_RECORD_MMAP2);
    w.write_u16(PERF_RECORD_MISC_USER);
    w.write_u16(size as u16);
    w.write_u32(pid);
    w.write_u32(pid);
    w.write_u64(start);
    w.write_u64(len);
    w.write_u64(pgoff);
    w.write_u32(6); // maj
    w.write_u32(6); // min
    w.write_u64(8); // ino
    w.write_u64(9); // ino_generation
    w.write_u32(1 | 4); // prot: PROT_READ | PROT_EXEC
    w.write_u32(2); // flags: MAP_PRIVATE
    w.write_bytes(filename);
    for _ in filename.len()..name_len {
        w.write_u8(0);
    }
    write_trailer(w, pid, pid, time);
}

/// PERF_RECORD_SAMPLE for sample_type IP | TID (| TIME when `time` given).
pub fn write_sample_event(w: &mut ByteWriter, ip: u64, pid: u32, tid: u32, time: Option<u64>) {
    let size = 8 + 8 + 8 + if time.is_some() { 8 } else { 0 };
    w.write_u32(PERF_RECORD_SAMPLE);
    w.write_u16(PERF_RECORD_MISC_USER);
    w.write_u16(size as u16);
    w.write_u64(ip);
    w.write_u32(pid);
    w.write_u32(tid);
    if let Some(time) = time {
        w.write_u64(time);
    }
}

/// PERF_RECORD_FINISHED_ROUND (header only).
pub fn write_finished_round(w: &mut ByteWriter) {
    w.write_u32(PERF_RECORD_FINISHED_ROUND);
    w.write_u16(0);
    w.write_u16(8);
}

/// PERF_RECORD_SWITCH_CPU_WIDE.
pub fn write_switch_cpu_wide(
    w: &mut ByteWriter,
    misc: u16,
    next_prev_pid: u32,
    next_prev_tid: u32,
    pid: u32,
    tid: u32,
    time: Option<u64>,
) {
    w.write_u32(PERF_RECORD_SWITCH_CPU_WIDE);
    w.write_u16(misc);
    w.write_u16((8 + 8 + trailer_size(time)) as u16);
    w.write_u32(next_prev_pid);
    w.write_u32(next_prev_tid);
    write_trailer(w, pid, tid, time);
}
