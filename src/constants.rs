//! Numeric constants from the kernel's perf_event.h ABI and from the perf
//! user tool's synthesized record types.

// Kernel-generated record types.
pub const PERF_RECORD_MMAP: u32 = 1;
pub const PERF_RECORD_LOST: u32 = 2;
pub const PERF_RECORD_COMM: u32 = 3;
pub const PERF_RECORD_EXIT: u32 = 4;
pub const PERF_RECORD_THROTTLE: u32 = 5;
pub const PERF_RECORD_UNTHROTTLE: u32 = 6;
pub const PERF_RECORD_FORK: u32 = 7;
pub const PERF_RECORD_READ: u32 = 8;
pub const PERF_RECORD_SAMPLE: u32 = 9;
pub const PERF_RECORD_MMAP2: u32 = 10;
pub const PERF_RECORD_AUX: u32 = 11;
pub const PERF_RECORD_ITRACE_START: u32 = 12;
pub const PERF_RECORD_LOST_SAMPLES: u32 = 13;
pub const PERF_RECORD_SWITCH: u32 = 14;
pub const PERF_RECORD_SWITCH_CPU_WIDE: u32 = 15;
pub const PERF_RECORD_NAMESPACES: u32 = 16;
pub const PERF_RECORD_KSYMBOL: u32 = 17;
pub const PERF_RECORD_BPF_EVENT: u32 = 18;
pub const PERF_RECORD_CGROUP: u32 = 19;
pub const PERF_RECORD_TEXT_POKE: u32 = 20;
pub const PERF_RECORD_AUX_OUTPUT_HW_ID: u32 = 21;

/// First record type value reserved for user-space tools.
pub const PERF_RECORD_USER_TYPE_START: u32 = 64;

// Record types synthesized by the perf user tool. Types below
// PERF_RECORD_HEADER_MAX appear in piped streams in place of the file
// header's sections.
pub const PERF_RECORD_HEADER_ATTR: u32 = 64;
pub const PERF_RECORD_HEADER_EVENT_TYPE: u32 = 65;
pub const PERF_RECORD_HEADER_TRACING_DATA: u32 = 66;
pub const PERF_RECORD_HEADER_BUILD_ID: u32 = 67;
pub const PERF_RECORD_FINISHED_ROUND: u32 = 68;
pub const PERF_RECORD_ID_INDEX: u32 = 69;
pub const PERF_RECORD_AUXTRACE_INFO: u32 = 70;
pub const PERF_RECORD_AUXTRACE: u32 = 71;
pub const PERF_RECORD_AUXTRACE_ERROR: u32 = 72;
pub const PERF_RECORD_THREAD_MAP: u32 = 73;
pub const PERF_RECORD_CPU_MAP: u32 = 74;
pub const PERF_RECORD_STAT_CONFIG: u32 = 75;
pub const PERF_RECORD_STAT: u32 = 76;
pub const PERF_RECORD_STAT_ROUND: u32 = 77;
pub const PERF_RECORD_EVENT_UPDATE: u32 = 78;
pub const PERF_RECORD_TIME_CONV: u32 = 79;
pub const PERF_RECORD_HEADER_FEATURE: u32 = 80;
pub const PERF_RECORD_COMPRESSED: u32 = 81;

// perf_event_attr.sample_type bits.
pub const PERF_SAMPLE_IP: u64 = 1 << 0;
pub const PERF_SAMPLE_TID: u64 = 1 << 1;
pub const PERF_SAMPLE_TIME: u64 = 1 << 2;
pub const PERF_SAMPLE_ADDR: u64 = 1 << 3;
pub const PERF_SAMPLE_READ: u64 = 1 << 4;
pub const PERF_SAMPLE_CALLCHAIN: u64 = 1 << 5;
pub const PERF_SAMPLE_ID: u64 = 1 << 6;
pub const PERF_SAMPLE_CPU: u64 = 1 << 7;
pub const PERF_SAMPLE_PERIOD: u64 = 1 << 8;
pub const PERF_SAMPLE_STREAM_ID: u64 = 1 << 9;
pub const PERF_SAMPLE_RAW: u64 = 1 << 10;
pub const PERF_SAMPLE_BRANCH_STACK: u64 = 1 << 11;
pub const PERF_SAMPLE_REGS_USER: u64 = 1 << 12;
pub const PERF_SAMPLE_STACK_USER: u64 = 1 << 13;
pub const PERF_SAMPLE_WEIGHT: u64 = 1 << 14;
pub const PERF_SAMPLE_DATA_SRC: u64 = 1 << 15;
pub const PERF_SAMPLE_IDENTIFIER: u64 = 1 << 16;
pub const PERF_SAMPLE_TRANSACTION: u64 = 1 << 17;
pub const PERF_SAMPLE_REGS_INTR: u64 = 1 << 18;
pub const PERF_SAMPLE_PHYS_ADDR: u64 = 1 << 19;
pub const PERF_SAMPLE_AUX: u64 = 1 << 20;
pub const PERF_SAMPLE_CGROUP: u64 = 1 << 21;
pub const PERF_SAMPLE_DATA_PAGE_SIZE: u64 = 1 << 22;
pub const PERF_SAMPLE_CODE_PAGE_SIZE: u64 = 1 << 23;
pub const PERF_SAMPLE_WEIGHT_STRUCT: u64 = 1 << 24;

// perf_event_attr.read_format bits.
pub const PERF_FORMAT_TOTAL_TIME_ENABLED: u64 = 1 << 0;
pub const PERF_FORMAT_TOTAL_TIME_RUNNING: u64 = 1 << 1;
pub const PERF_FORMAT_ID: u64 = 1 << 2;
pub const PERF_FORMAT_GROUP: u64 = 1 << 3;
pub const PERF_FORMAT_LOST: u64 = 1 << 4;

// perf_event_attr flag bits (the bitfield that follows read_format).
pub const ATTR_FLAG_BIT_DISABLED: u64 = 1 << 0;
pub const ATTR_FLAG_BIT_INHERIT: u64 = 1 << 1;
pub const ATTR_FLAG_BIT_PINNED: u64 = 1 << 2;
pub const ATTR_FLAG_BIT_EXCLUSIVE: u64 = 1 << 3;
pub const ATTR_FLAG_BIT_EXCLUDE_USER: u64 = 1 << 4;
pub const ATTR_FLAG_BIT_EXCLUDE_KERNEL: u64 = 1 << 5;
pub const ATTR_FLAG_BIT_EXCLUDE_HV: u64 = 1 << 6;
pub const ATTR_FLAG_BIT_EXCLUDE_IDLE: u64 = 1 << 7;
pub const ATTR_FLAG_BIT_MMAP: u64 = 1 << 8;
pub const ATTR_FLAG_BIT_COMM: u64 = 1 << 9;
pub const ATTR_FLAG_BIT_FREQ: u64 = 1 << 10;
pub const ATTR_FLAG_BIT_INHERIT_STAT: u64 = 1 << 11;
pub const ATTR_FLAG_BIT_ENABLE_ON_EXEC: u64 = 1 << 12;
pub const ATTR_FLAG_BIT_TASK: u64 = 1 << 13;
pub const ATTR_FLAG_BIT_WATERMARK: u64 = 1 << 14;
/// Two-bit skid constraint, see `EventAttr::precise_ip`.
pub const ATTR_FLAG_BITMASK_PRECISE_IP: u64 = 1 << 15 | 1 << 16;
pub const ATTR_FLAG_BIT_MMAP_DATA: u64 = 1 << 17;
pub const ATTR_FLAG_BIT_SAMPLE_ID_ALL: u64 = 1 << 18;
pub const ATTR_FLAG_BIT_EXCLUDE_HOST: u64 = 1 << 19;
pub const ATTR_FLAG_BIT_EXCLUDE_GUEST: u64 = 1 << 20;
pub const ATTR_FLAG_BIT_EXCLUDE_CALLCHAIN_KERNEL: u64 = 1 << 21;
pub const ATTR_FLAG_BIT_EXCLUDE_CALLCHAIN_USER: u64 = 1 << 22;
pub const ATTR_FLAG_BIT_MMAP2: u64 = 1 << 23;
pub const ATTR_FLAG_BIT_COMM_EXEC: u64 = 1 << 24;
pub const ATTR_FLAG_BIT_USE_CLOCKID: u64 = 1 << 25;
pub const ATTR_FLAG_BIT_CONTEXT_SWITCH: u64 = 1 << 26;
pub const ATTR_FLAG_BIT_WRITE_BACKWARD: u64 = 1 << 27;
pub const ATTR_FLAG_BIT_NAMESPACES: u64 = 1 << 28;
pub const ATTR_FLAG_BIT_KSYMBOL: u64 = 1 << 29;
pub const ATTR_FLAG_BIT_BPF_EVENT: u64 = 1 << 30;
pub const ATTR_FLAG_BIT_AUX_OUTPUT: u64 = 1 << 31;
pub const ATTR_FLAG_BIT_CGROUP: u64 = 1 << 32;
pub const ATTR_FLAG_BIT_TEXT_POKE: u64 = 1 << 33;
pub const ATTR_FLAG_BIT_BUILD_ID: u64 = 1 << 34;
pub const ATTR_FLAG_BIT_INHERIT_THREAD: u64 = 1 << 35;
pub const ATTR_FLAG_BIT_REMOVE_ON_EXEC: u64 = 1 << 36;
pub const ATTR_FLAG_BIT_SIGTRAP: u64 = 1 << 37;

// perf_event_attr sizes at each published revision of the struct.
pub const PERF_ATTR_SIZE_VER0: u32 = 64;
pub const PERF_ATTR_SIZE_VER1: u32 = 72;
pub const PERF_ATTR_SIZE_VER2: u32 = 80;
pub const PERF_ATTR_SIZE_VER3: u32 = 96;
pub const PERF_ATTR_SIZE_VER4: u32 = 104;
pub const PERF_ATTR_SIZE_VER5: u32 = 112;
pub const PERF_ATTR_SIZE_VER6: u32 = 120;
pub const PERF_ATTR_SIZE_VER7: u32 = 128;

// perf_branch_sample_type bits.
pub const PERF_SAMPLE_BRANCH_USER: u64 = 1 << 0;
pub const PERF_SAMPLE_BRANCH_KERNEL: u64 = 1 << 1;
pub const PERF_SAMPLE_BRANCH_HV: u64 = 1 << 2;
pub const PERF_SAMPLE_BRANCH_ANY: u64 = 1 << 3;
pub const PERF_SAMPLE_BRANCH_ANY_CALL: u64 = 1 << 4;
pub const PERF_SAMPLE_BRANCH_ANY_RETURN: u64 = 1 << 5;
pub const PERF_SAMPLE_BRANCH_IND_CALL: u64 = 1 << 6;
pub const PERF_SAMPLE_BRANCH_ABORT_TX: u64 = 1 << 7;
pub const PERF_SAMPLE_BRANCH_IN_TX: u64 = 1 << 8;
pub const PERF_SAMPLE_BRANCH_NO_TX: u64 = 1 << 9;
pub const PERF_SAMPLE_BRANCH_COND: u64 = 1 << 10;
pub const PERF_SAMPLE_BRANCH_CALL_STACK: u64 = 1 << 11;
pub const PERF_SAMPLE_BRANCH_IND_JUMP: u64 = 1 << 12;
pub const PERF_SAMPLE_BRANCH_CALL: u64 = 1 << 13;
pub const PERF_SAMPLE_BRANCH_NO_FLAGS: u64 = 1 << 14;
pub const PERF_SAMPLE_BRANCH_NO_CYCLES: u64 = 1 << 15;
pub const PERF_SAMPLE_BRANCH_TYPE_SAVE: u64 = 1 << 16;
pub const PERF_SAMPLE_BRANCH_HW_INDEX: u64 = 1 << 17;

// perf_event_header.misc bits.
pub const PERF_RECORD_MISC_CPUMODE_MASK: u16 = 0b111;
pub const PERF_RECORD_MISC_CPUMODE_UNKNOWN: u16 = 0;
pub const PERF_RECORD_MISC_KERNEL: u16 = 1;
pub const PERF_RECORD_MISC_USER: u16 = 2;
pub const PERF_RECORD_MISC_HYPERVISOR: u16 = 3;
pub const PERF_RECORD_MISC_GUEST_KERNEL: u16 = 4;
pub const PERF_RECORD_MISC_GUEST_USER: u16 = 5;
/// /proc/PID/maps parsing was cut short by a timeout; the MMAP record is
/// unreliable and gets dropped.
pub const PERF_RECORD_MISC_PROC_MAP_PARSE_TIMEOUT: u16 = 1 << 12;
/// On MMAP records: mapping is not executable.
pub const PERF_RECORD_MISC_MMAP_DATA: u16 = 1 << 13;
/// On COMM records: the rename was caused by exec.
pub const PERF_RECORD_MISC_COMM_EXEC: u16 = 1 << 13;
/// On SWITCH and SWITCH_CPU_WIDE records: this is the switch-out side.
pub const PERF_RECORD_MISC_SWITCH_OUT: u16 = 1 << 13;
/// On SAMPLE records of precise events.
pub const PERF_RECORD_MISC_EXACT_IP: u16 = 1 << 14;
/// On SWITCH* records: the thread was preempted while runnable.
pub const PERF_RECORD_MISC_SWITCH_OUT_PREEMPT: u16 = 1 << 14;
/// On MMAP2 records: the inode union carries a build ID instead.
pub const PERF_RECORD_MISC_MMAP_BUILD_ID: u16 = 1 << 14;
/// On HEADER_BUILD_ID events: the entry states the build ID length.
pub const PERF_RECORD_MISC_BUILD_ID_SIZE: u16 = 1 << 15;

// Callchain context markers; entries >= PERF_CONTEXT_MAX are not addresses.
pub const PERF_CONTEXT_HV: u64 = -32i64 as u64;
pub const PERF_CONTEXT_KERNEL: u64 = -128i64 as u64;
pub const PERF_CONTEXT_USER: u64 = -512i64 as u64;
pub const PERF_CONTEXT_GUEST: u64 = -2048i64 as u64;
pub const PERF_CONTEXT_GUEST_KERNEL: u64 = -2176i64 as u64;
pub const PERF_CONTEXT_GUEST_USER: u64 = -2560i64 as u64;
pub const PERF_CONTEXT_MAX: u64 = -4095i64 as u64;

/// Longest message carried by an AUXTRACE_ERROR record; longer messages are
/// truncated on the wire.
pub const MAX_AUXTRACE_ERROR_MSG: usize = 64;

/// The pid that marks kernel mappings in MMAP records synthesized by perf.
pub const KERNEL_PID: u32 = u32::MAX;
