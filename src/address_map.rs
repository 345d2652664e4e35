use std::collections::{BTreeMap, HashMap};

use crate::constants::KERNEL_PID;

/// Device and inode identification carried by MMAP2 records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InodeInfo {
    pub maj: u32,
    pub min: u32,
    pub ino: u64,
    pub ino_generation: u64,
}

/// One live executable mapping of a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub start: u64,
    pub len: u64,
    pub file_offset: u64,
    pub filename: Vec<u8>,
    pub pid: u32,
    pub tid: u32,
    pub prot: u32,
    pub flags: u32,
    pub inode: Option<InodeInfo>,
    pub build_id: Option<Vec<u8>>,
    /// The mapping's start address in the dense remapped space, assigned
    /// when the mapping is established.
    pub remapped_start: u64,
}

impl Mapping {
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.len)
    }

    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr - self.start < self.len
    }
}

#[derive(Debug, Clone, Default)]
struct ProcessMap {
    /// Live mappings keyed by start address; disjoint by construction.
    mappings: BTreeMap<u64, Mapping>,
    /// Next free address in the dense remapped space.
    remap_cursor: u64,
}

/// Lowest address of the kernel half of a 64-bit address space. Used only
/// to decide whether the synthetic covering kernel mapping may resolve an
/// address when no kernel MMAP was observed.
const KERNEL_SPACE_START: u64 = 0xffff_8000_0000_0000;

/// The per-process interval map of executable mappings.
///
/// Inserting an overlapping mapping gives the new one precedence: the
/// overlapped parts of older mappings are split away or truncated. Lookups
/// that miss the process fall back to the kernel's own map (pid
/// [`KERNEL_PID`]).
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    processes: HashMap<u32, ProcessMap>,
    kernel_remap_base: u64,
}

impl MappingTable {
    pub fn new(kernel_remap_base: u64) -> Self {
        Self {
            processes: HashMap::new(),
            kernel_remap_base,
        }
    }

    fn process_mut(&mut self, pid: u32) -> &mut ProcessMap {
        let kernel_remap_base = self.kernel_remap_base;
        self.processes.entry(pid).or_insert_with(|| ProcessMap {
            mappings: BTreeMap::new(),
            remap_cursor: if pid == KERNEL_PID {
                kernel_remap_base
            } else {
                0
            },
        })
    }

    /// Establish a mapping. Overlapping portions of existing mappings are
    /// removed; the new mapping wins. Returns the remapped start assigned
    /// to the new mapping. Zero-length mappings must be rejected by the
    /// caller.
    pub fn insert(&mut self, mut mapping: Mapping) -> u64 {
        debug_assert!(mapping.len != 0);
        let pid = mapping.pid;
        let process = self.process_mut(pid);

        let new_start = mapping.start;
        let new_end = mapping.end();

        // Collect everything that overlaps [new_start, new_end).
        let overlapping: Vec<u64> = process
            .mappings
            .range(..new_end)
            .rev()
            .take_while(|(_, old)| old.end() > new_start)
            .map(|(start, _)| *start)
            .collect();

        for old_start in overlapping {
            let old = process.mappings.remove(&old_start).unwrap();
            if old.start < new_start {
                // Keep the part below the new mapping.
                let mut left = old.clone();
                left.len = new_start - old.start;
                process.mappings.insert(left.start, left);
            }
            if old.end() > new_end {
                // Keep the part above the new mapping; its file offset and
                // remapped address shift along.
                let mut right = old.clone();
                let delta = new_end - old.start;
                right.start = new_end;
                right.len = old.end() - new_end;
                right.file_offset = old.file_offset.wrapping_add(delta);
                right.remapped_start = old.remapped_start.wrapping_add(delta);
                process.mappings.insert(right.start, right);
            }
        }

        mapping.remapped_start = process.remap_cursor;
        process.remap_cursor = process.remap_cursor.saturating_add(mapping.len);
        let remapped_start = mapping.remapped_start;
        process.mappings.insert(mapping.start, mapping);
        remapped_start
    }

    fn lookup_in(process: &ProcessMap, addr: u64) -> Option<&Mapping> {
        process
            .mappings
            .range(..=addr)
            .next_back()
            .map(|(_, mapping)| mapping)
            .filter(|mapping| mapping.contains(addr))
    }

    /// Resolve `addr` in the context of `pid`, falling back to the kernel's
    /// mappings. When no kernel mapping was ever observed, kernel-half
    /// addresses resolve against an assumed covering mapping.
    pub fn lookup(&self, pid: u32, addr: u64) -> Option<&Mapping> {
        if let Some(process) = self.processes.get(&pid) {
            if let Some(mapping) = Self::lookup_in(process, addr) {
                return Some(mapping);
            }
        }
        if let Some(kernel) = self.processes.get(&KERNEL_PID) {
            if let Some(mapping) = Self::lookup_in(kernel, addr) {
                return Some(mapping);
            }
        }
        None
    }

    /// Like [`lookup`](Self::lookup) but consulting `tid` first, then
    /// `pid`, then the kernel.
    pub fn lookup_tid_then_pid(&self, tid: u32, pid: u32, addr: u64) -> Option<&Mapping> {
        if let Some(process) = self.processes.get(&tid) {
            if let Some(mapping) = Self::lookup_in(process, addr) {
                return Some(mapping);
            }
        }
        if tid != pid {
            if let Some(process) = self.processes.get(&pid) {
                if let Some(mapping) = Self::lookup_in(process, addr) {
                    return Some(mapping);
                }
            }
        }
        if let Some(kernel) = self.processes.get(&KERNEL_PID) {
            if let Some(mapping) = Self::lookup_in(kernel, addr) {
                return Some(mapping);
            }
        }
        None
    }

    /// Whether any real kernel mapping has been observed.
    pub fn has_kernel_mapping(&self) -> bool {
        self.processes
            .get(&KERNEL_PID)
            .is_some_and(|kernel| !kernel.mappings.is_empty())
    }

    /// Whether `addr` can only be satisfied by the assumed covering kernel
    /// mapping (no kernel MMAP observed, address in the kernel half).
    pub fn in_assumed_kernel_space(&self, addr: u64) -> bool {
        !self.has_kernel_mapping() && addr >= KERNEL_SPACE_START
    }

    /// Fork inheritance: the child starts out with a copy of the parent's
    /// live mappings. An existing child map is left alone.
    pub fn clone_process(&mut self, parent_pid: u32, child_pid: u32) {
        if parent_pid == child_pid || self.processes.contains_key(&child_pid) {
            return;
        }
        if let Some(parent) = self.processes.get(&parent_pid) {
            let child = parent.clone();
            self.processes.insert(child_pid, child);
        }
    }

    /// Drop a process's mappings on exit.
    pub fn remove_process(&mut self, pid: u32) {
        self.processes.remove(&pid);
    }

    pub fn pids(&self) -> impl Iterator<Item = u32> + '_ {
        self.processes.keys().copied()
    }

    /// Iterate a process's live mappings in address order.
    pub fn mappings_for(&self, pid: u32) -> impl Iterator<Item = &Mapping> {
        self.processes
            .get(&pid)
            .into_iter()
            .flat_map(|process| process.mappings.values())
    }

    /// Check the disjointness invariant; used by tests.
    pub fn is_disjoint(&self) -> bool {
        for process in self.processes.values() {
            let mut prev_end = 0u64;
            for mapping in process.mappings.values() {
                if mapping.start < prev_end {
                    return false;
                }
                prev_end = mapping.end();
            }
        }
        true
    }
}
