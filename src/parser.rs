use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::warn;

use crate::address_map::{InodeInfo, Mapping, MappingTable};
use crate::build_id_event::BuildIdRecord;
use crate::error::Error;
use crate::event_record::{Event, EventData, Mmap2FileId};
use crate::file_reader::PerfData;
use crate::probe::{is_probeable_filename, probe_build_id, FileSystemProbe};
use crate::types::RecordType;

/// Knobs for one parse pass.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Rewrite addresses into the dense per-process remapped space, to
    /// decouple the profile from capture-time ASLR choices.
    pub do_remap: bool,
    /// Relabel anonymous huge-page mappings that carry a contiguous range
    /// of an executable's file offsets.
    pub deduce_huge_page_mappings: bool,
    /// Merge adjacent mappings of the same file.
    pub combine_mappings: bool,
    /// Sort events chronologically before parsing, when the attributes
    /// allow it.
    pub sort_events_by_time: bool,
    /// Percentage (0..=100) of samples that must resolve to a mapping for
    /// the parse to be considered usable.
    pub sample_mapping_percentage_threshold: f64,
    /// Probe the local filesystem for build IDs of mappings that have none.
    pub read_missing_buildids: bool,
    /// The base of the remapped kernel space.
    pub kernel_remap_base: u64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            do_remap: false,
            deduce_huge_page_mappings: true,
            combine_mappings: true,
            sort_events_by_time: true,
            sample_mapping_percentage_threshold: 95.0,
            read_missing_buildids: false,
            kernel_remap_base: 0,
        }
    }
}

/// Aggregate counters from one parse pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub num_mmap_events: u64,
    pub num_sample_events: u64,
    pub num_sample_events_mapped: u64,
    pub num_data_sample_events: u64,
    pub num_data_sample_events_mapped: u64,
    pub did_remap: bool,
}

/// A resolved address: which DSO it fell into and where in that file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsoAndOffset {
    pub dso_name: Vec<u8>,
    pub offset: u64,
    /// Perfized hex build ID, when one is known for the DSO.
    pub build_id: Option<String>,
}

/// Resolution of one branch-stack entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchResolution {
    pub from: Option<DsoAndOffset>,
    pub to: Option<DsoAndOffset>,
}

/// One event of the output sequence: an index into the arena plus whatever
/// resolutions the parse produced for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvent {
    /// Index into [`PerfData::events`].
    pub event_index: usize,
    pub dso_and_offset: Option<DsoAndOffset>,
    pub data_dso_and_offset: Option<DsoAndOffset>,
    pub branch_stack: Vec<BranchResolution>,
}

/// Cooperative cancellation for long parses. Cloned tokens share one flag;
/// the parser checks it between events.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Walks the reader's event list, maintains the per-process mapping table,
/// resolves sample addresses, and optionally rewrites addresses into the
/// remapped space.
pub struct PerfParser<'a> {
    data: &'a mut PerfData,
    options: ParseOptions,
    stats: Stats,
    table: MappingTable,
    parsed: Vec<ParsedEvent>,
    probe: Option<&'a dyn FileSystemProbe>,
    cancel: Option<CancelToken>,
}

impl<'a> PerfParser<'a> {
    pub fn new(data: &'a mut PerfData, options: ParseOptions) -> Self {
        let kernel_remap_base = options.kernel_remap_base;
        Self {
            data,
            options,
            stats: Stats::default(),
            table: MappingTable::new(kernel_remap_base),
            parsed: Vec::new(),
            probe: None,
            cancel: None,
        }
    }

    /// Use `probe` to look up build IDs for mappings that carry none.
    /// Only consulted when `read_missing_buildids` is set.
    pub fn set_probe(&mut self, probe: &'a dyn FileSystemProbe) {
        self.probe = Some(probe);
    }

    pub fn set_cancel_token(&mut self, token: CancelToken) {
        self.cancel = Some(token);
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn parsed_events(&self) -> &[ParsedEvent] {
        &self.parsed
    }

    pub fn mapping_table(&self) -> &MappingTable {
        &self.table
    }

    /// Release the borrow of the model and keep the parse outputs.
    pub fn into_parsed(self) -> (Vec<ParsedEvent>, Stats) {
        (self.parsed, self.stats)
    }

    /// Run the full pass. On success the arena holds the (possibly
    /// rewritten) events and `parsed_events` describes the output sequence.
    pub fn parse(&mut self) -> Result<(), Error> {
        if self.options.sort_events_by_time {
            self.data.maybe_sort_events_by_time();
        }

        // FINISHED_ROUND is a buffering hint for streamed consumers; it is
        // dropped from the output and never reordered.
        self.data
            .events
            .retain(|event| event.record_type() != RecordType::FINISHED_ROUND);

        if self.options.deduce_huge_page_mappings {
            deduce_huge_pages(&mut self.data.events);
        }
        if self.options.combine_mappings {
            combine_mappings(&mut self.data.events);
        }

        for event_index in 0..self.data.events.len() {
            if let Some(cancel) = &self.cancel {
                if cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }
            }
            self.process_event(event_index)?;
        }

        if self.options.do_remap {
            self.stats.did_remap = true;
        }

        let total = self.stats.num_sample_events;
        let mapped = self.stats.num_sample_events_mapped;
        let threshold = self.options.sample_mapping_percentage_threshold;
        if total > 0 && (mapped as f64) * 100.0 < threshold * total as f64 {
            return Err(Error::InsufficientlyMapped {
                mapped,
                total,
                threshold,
            });
        }
        Ok(())
    }

    fn process_event(&mut self, event_index: usize) -> Result<(), Error> {
        let mut parsed = ParsedEvent {
            event_index,
            dso_and_offset: None,
            data_dso_and_offset: None,
            branch_stack: Vec::new(),
        };

        let record_type = self.data.events[event_index].record_type();
        match record_type {
            RecordType::MMAP | RecordType::MMAP2 => self.process_mmap(event_index),
            RecordType::FORK => {
                if let EventData::Fork(fork) = &self.data.events[event_index].data {
                    self.table.clone_process(fork.ppid, fork.pid);
                }
            }
            RecordType::EXIT => {
                // Inherited mappings are preserved: samples attributed to a
                // pid can still arrive after its EXIT record.
            }
            RecordType::SAMPLE => self.process_sample(event_index, &mut parsed),
            _ => {}
        }

        self.parsed.push(parsed);
        Ok(())
    }

    fn process_mmap(&mut self, event_index: usize) {
        let event = &self.data.events[event_index];
        let misc = event.misc;
        let Some(view) = mmap_view(&event.data) else {
            return;
        };
        if view.len == 0 {
            warn!("ignoring zero-length mapping of {:?}", view.filename);
            return;
        }

        // MMAP2 records may carry the DSO's build ID inline; the first
        // record per filename wins.
        if let EventData::Mmap2(mmap) = &event.data {
            if let Mmap2FileId::BuildId(build_id) = &mmap.file_id {
                if !self.data.build_ids.contains(&mmap.filename) {
                    self.data.build_ids.observe_record(&BuildIdRecord {
                        misc,
                        pid: mmap.pid as i32,
                        build_id: build_id.clone(),
                        filename: mmap.filename.clone(),
                    });
                }
            }
        }

        let mapping = Mapping {
            start: view.start,
            len: view.len,
            file_offset: view.pgoff,
            filename: view.filename.to_vec(),
            pid: view.pid,
            tid: view.tid,
            prot: view.prot,
            flags: view.flags,
            inode: view.inode,
            build_id: None,
            remapped_start: 0,
        };
        let remapped_start = self.table.insert(mapping);
        self.stats.num_mmap_events += 1;

        if self.options.do_remap {
            let event = &mut self.data.events[event_index];
            match &mut event.data {
                EventData::Mmap(mmap) => {
                    mmap.addr = remapped_start;
                    if is_kernel_mapping_name(&mmap.filename) {
                        mmap.pgoff = 0;
                    }
                }
                EventData::Mmap2(mmap) => {
                    mmap.addr = remapped_start;
                    if is_kernel_mapping_name(&mmap.filename) {
                        mmap.pgoff = 0;
                    }
                }
                _ => {}
            }
        }
    }

    fn process_sample(&mut self, event_index: usize, parsed: &mut ParsedEvent) {
        let (pid, tid, ip, addr, branch_addrs, has_addr_field) = {
            let EventData::Sample(sample) = &self.data.events[event_index].data else {
                return;
            };
            let branch_addrs: Vec<(u64, u64)> = sample
                .branch_stack
                .as_ref()
                .map(|stack| {
                    stack
                        .entries
                        .iter()
                        .map(|entry| (entry.from, entry.to))
                        .collect()
                })
                .unwrap_or_default();
            (
                sample.pid.unwrap_or(0),
                sample.tid.unwrap_or(0),
                sample.ip,
                sample.addr,
                branch_addrs,
                sample.addr.is_some(),
            )
        };

        self.stats.num_sample_events += 1;

        let mut new_ip = None;
        if let Some(ip) = ip {
            if let Some((resolution, remapped)) = self.resolve(tid, pid, ip) {
                parsed.dso_and_offset = Some(resolution);
                self.stats.num_sample_events_mapped += 1;
                if self.options.do_remap {
                    new_ip = Some(remapped);
                }
            }
        }

        let mut new_addr = None;
        if has_addr_field {
            let addr = addr.unwrap_or(0);
            if addr != 0 {
                self.stats.num_data_sample_events += 1;
                if let Some((resolution, remapped)) = self.resolve(tid, pid, addr) {
                    parsed.data_dso_and_offset = Some(resolution);
                    self.stats.num_data_sample_events_mapped += 1;
                    if self.options.do_remap {
                        new_addr = Some(remapped);
                    }
                }
            }
        }

        for (from, to) in branch_addrs {
            parsed.branch_stack.push(BranchResolution {
                from: self.resolve(tid, pid, from).map(|(r, _)| r),
                to: self.resolve(tid, pid, to).map(|(r, _)| r),
            });
        }

        if new_ip.is_some() || new_addr.is_some() {
            let EventData::Sample(sample) = &mut self.data.events[event_index].data else {
                return;
            };
            if let Some(ip) = new_ip {
                sample.ip = Some(ip);
            }
            if let Some(addr) = new_addr {
                sample.addr = Some(addr);
            }
        }
    }

    /// Resolve an address to its DSO and file offset, and compute its
    /// remapped location. Missing build IDs are probed on first use.
    fn resolve(&mut self, tid: u32, pid: u32, addr: u64) -> Option<(DsoAndOffset, u64)> {
        let (filename, file_offset, remapped_addr, inode) = {
            match self.table.lookup_tid_then_pid(tid, pid, addr) {
                Some(mapping) => (
                    mapping.filename.clone(),
                    mapping.file_offset + (addr - mapping.start),
                    mapping.remapped_start.wrapping_add(addr - mapping.start),
                    mapping.inode,
                ),
                // Without any observed kernel MMAP, kernel-half addresses
                // resolve against an assumed covering kernel mapping.
                None if self.table.in_assumed_kernel_space(addr) => {
                    (b"[kernel.kallsyms]".to_vec(), addr, addr, None)
                }
                None => return None,
            }
        };

        if self.options.read_missing_buildids
            && !self.data.build_ids.contains(&filename)
            && is_probeable_filename(&filename)
        {
            if let Some(probe) = self.probe {
                if let Some(build_id) = probe_build_id(probe, &filename, tid, pid, inode) {
                    self.data.build_ids.observe_record(&BuildIdRecord::new(
                        build_id,
                        filename.clone(),
                        None,
                    ));
                }
            }
        }

        let build_id = self.data.build_ids.get(&filename).map(str::to_string);
        Some((
            DsoAndOffset {
                dso_name: filename,
                offset: file_offset,
                build_id,
            },
            remapped_addr,
        ))
    }
}

fn is_kernel_mapping_name(filename: &[u8]) -> bool {
    memchr::memmem::find(filename, b"kernel.kallsyms").is_some()
}

/// A uniform view over MMAP and MMAP2 payloads.
struct MmapView<'a> {
    pid: u32,
    tid: u32,
    start: u64,
    len: u64,
    pgoff: u64,
    prot: u32,
    flags: u32,
    filename: &'a [u8],
    inode: Option<InodeInfo>,
}

fn mmap_view(data: &EventData) -> Option<MmapView<'_>> {
    match data {
        EventData::Mmap(mmap) => Some(MmapView {
            pid: mmap.pid,
            tid: mmap.tid,
            start: mmap.addr,
            len: mmap.len,
            pgoff: mmap.pgoff,
            prot: 0,
            flags: 0,
            filename: &mmap.filename,
            inode: None,
        }),
        EventData::Mmap2(mmap) => Some(MmapView {
            pid: mmap.pid,
            tid: mmap.tid,
            start: mmap.addr,
            len: mmap.len,
            pgoff: mmap.pgoff,
            prot: mmap.prot,
            flags: mmap.flags,
            filename: &mmap.filename,
            inode: match mmap.file_id {
                Mmap2FileId::InodeAndVersion {
                    maj,
                    min,
                    ino,
                    ino_generation,
                } => Some(InodeInfo {
                    maj,
                    min,
                    ino,
                    ino_generation,
                }),
                Mmap2FileId::BuildId(_) => None,
            },
        }),
        _ => None,
    }
}

fn mmap_fields(data: &EventData) -> Option<(u32, u64, u64, u64, &[u8])> {
    mmap_view(data).map(|view| (view.pid, view.start, view.len, view.pgoff, view.filename))
}

const ANON_FILENAME: &[u8] = b"//anon";

/// The index of the next/previous MMAP-type event for the same pid.
fn neighbor_mmap(
    events: &[Event],
    from: usize,
    pid: u32,
    forward: bool,
) -> Option<usize> {
    let mut index = from;
    loop {
        if forward {
            index += 1;
            if index >= events.len() {
                return None;
            }
        } else {
            if index == 0 {
                return None;
            }
            index -= 1;
        }
        if let Some((event_pid, ..)) = mmap_fields(&events[index].data) {
            if event_pid == pid {
                return Some(index);
            }
        }
    }
}

/// Relabel anonymous huge-page mappings that back a contiguous range of an
/// executable's file offsets.
///
/// Case 1, the sandwich: a named mapping, then `//anon`, then the same
/// file again, all contiguous in addresses and file offsets. Case 2, a
/// leading `//anon` directly followed by the named mapping, where the
/// named mapping's file offset has room for the anonymous prefix.
/// Non-contiguous neighbors disable the deduction.
fn deduce_huge_pages(events: &mut Vec<Event>) {
    for index in 0..events.len() {
        let Some((pid, anon_start, anon_len, _, filename)) = mmap_fields(&events[index].data)
        else {
            continue;
        };
        if filename != ANON_FILENAME || anon_len == 0 {
            continue;
        }

        let next = neighbor_mmap(events, index, pid, true);
        let prev = neighbor_mmap(events, index, pid, false);

        let mut new_name_and_offset: Option<(Vec<u8>, u64)> = None;

        if let (Some(prev_index), Some(next_index)) = (prev, next) {
            let (_, prev_start, prev_len, prev_pgoff, prev_name) =
                mmap_fields(&events[prev_index].data).unwrap();
            let (_, next_start, _, next_pgoff, next_name) =
                mmap_fields(&events[next_index].data).unwrap();
            if prev_name == next_name
                && prev_name != ANON_FILENAME
                && prev_start + prev_len == anon_start
                && anon_start + anon_len == next_start
                && prev_pgoff + prev_len + anon_len == next_pgoff
            {
                new_name_and_offset = Some((prev_name.to_vec(), prev_pgoff + prev_len));
            }
        }

        if new_name_and_offset.is_none() {
            if let Some(next_index) = next {
                let (_, next_start, _, next_pgoff, next_name) =
                    mmap_fields(&events[next_index].data).unwrap();
                if next_name != ANON_FILENAME
                    && anon_start + anon_len == next_start
                    && next_pgoff >= anon_len
                {
                    new_name_and_offset = Some((next_name.to_vec(), next_pgoff - anon_len));
                }
            }
        }

        if let Some((name, pgoff)) = new_name_and_offset {
            match &mut events[index].data {
                EventData::Mmap(mmap) => {
                    mmap.filename = name;
                    mmap.pgoff = pgoff;
                }
                EventData::Mmap2(mmap) => {
                    mmap.filename = name;
                    mmap.pgoff = pgoff;
                }
                _ => {}
            }
        }
    }
}

/// Merge consecutive mappings of the same file whose address ranges and
/// file offsets line up. The earlier MMAP event absorbs the later one,
/// which disappears from the sequence.
fn combine_mappings(events: &mut Vec<Event>) {
    let mut index = 0;
    while index < events.len() {
        let Some((pid, start, len, pgoff, filename)) = mmap_fields(&events[index].data) else {
            index += 1;
            continue;
        };
        let Some(prev_index) = neighbor_mmap(events, index, pid, false) else {
            index += 1;
            continue;
        };
        let (_, prev_start, prev_len, prev_pgoff, prev_name) =
            mmap_fields(&events[prev_index].data).unwrap();

        let mergeable = prev_name == filename
            && prev_start + prev_len == start
            && prev_pgoff + prev_len == pgoff
            && mmap_flags_match(&events[prev_index].data, &events[index].data);
        if !mergeable {
            index += 1;
            continue;
        }

        let grown_len = prev_len + len;
        match &mut events[prev_index].data {
            EventData::Mmap(mmap) => mmap.len = grown_len,
            EventData::Mmap2(mmap) => mmap.len = grown_len,
            _ => {}
        }
        events.remove(index);
        // Do not advance: the event now at `index` may merge into the same
        // grown mapping.
    }
}

/// Mappings only combine when their protection and flag bits agree (plain
/// MMAP records carry neither, so they always agree among themselves).
fn mmap_flags_match(a: &EventData, b: &EventData) -> bool {
    match (a, b) {
        (EventData::Mmap(_), EventData::Mmap(_)) => true,
        (EventData::Mmap2(a), EventData::Mmap2(b)) => a.prot == b.prot && a.flags == b.flags,
        _ => false,
    }
}
