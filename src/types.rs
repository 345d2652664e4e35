use std::fmt;

use bitflags::bitflags;

use crate::constants::*;

/// The type field of a record header.
///
/// Values below [`PERF_RECORD_USER_TYPE_START`] are generated by the kernel;
/// everything at or above it was synthesized by the perf user tool.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordType(pub u32);

impl RecordType {
    pub const MMAP: Self = Self(PERF_RECORD_MMAP);
    pub const LOST: Self = Self(PERF_RECORD_LOST);
    pub const COMM: Self = Self(PERF_RECORD_COMM);
    pub const EXIT: Self = Self(PERF_RECORD_EXIT);
    pub const THROTTLE: Self = Self(PERF_RECORD_THROTTLE);
    pub const UNTHROTTLE: Self = Self(PERF_RECORD_UNTHROTTLE);
    pub const FORK: Self = Self(PERF_RECORD_FORK);
    pub const READ: Self = Self(PERF_RECORD_READ);
    pub const SAMPLE: Self = Self(PERF_RECORD_SAMPLE);
    pub const MMAP2: Self = Self(PERF_RECORD_MMAP2);
    pub const AUX: Self = Self(PERF_RECORD_AUX);
    pub const ITRACE_START: Self = Self(PERF_RECORD_ITRACE_START);
    pub const LOST_SAMPLES: Self = Self(PERF_RECORD_LOST_SAMPLES);
    pub const SWITCH: Self = Self(PERF_RECORD_SWITCH);
    pub const SWITCH_CPU_WIDE: Self = Self(PERF_RECORD_SWITCH_CPU_WIDE);
    pub const NAMESPACES: Self = Self(PERF_RECORD_NAMESPACES);
    pub const CGROUP: Self = Self(PERF_RECORD_CGROUP);

    pub const HEADER_ATTR: Self = Self(PERF_RECORD_HEADER_ATTR);
    pub const HEADER_EVENT_TYPE: Self = Self(PERF_RECORD_HEADER_EVENT_TYPE);
    pub const HEADER_TRACING_DATA: Self = Self(PERF_RECORD_HEADER_TRACING_DATA);
    pub const HEADER_BUILD_ID: Self = Self(PERF_RECORD_HEADER_BUILD_ID);
    pub const FINISHED_ROUND: Self = Self(PERF_RECORD_FINISHED_ROUND);
    pub const AUXTRACE_INFO: Self = Self(PERF_RECORD_AUXTRACE_INFO);
    pub const AUXTRACE: Self = Self(PERF_RECORD_AUXTRACE);
    pub const AUXTRACE_ERROR: Self = Self(PERF_RECORD_AUXTRACE_ERROR);
    pub const THREAD_MAP: Self = Self(PERF_RECORD_THREAD_MAP);
    pub const STAT_CONFIG: Self = Self(PERF_RECORD_STAT_CONFIG);
    pub const STAT: Self = Self(PERF_RECORD_STAT);
    pub const STAT_ROUND: Self = Self(PERF_RECORD_STAT_ROUND);
    pub const TIME_CONV: Self = Self(PERF_RECORD_TIME_CONV);
    pub const HEADER_FEATURE: Self = Self(PERF_RECORD_HEADER_FEATURE);

    /// Whether this type is generated by the kernel (as opposed to being
    /// synthesized by the perf user tool).
    pub fn is_kernel_type(self) -> bool {
        self.0 < PERF_RECORD_USER_TYPE_START
    }

    pub fn is_user_type(self) -> bool {
        self.0 >= PERF_RECORD_USER_TYPE_START
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::MMAP => "MMAP",
            Self::LOST => "LOST",
            Self::COMM => "COMM",
            Self::EXIT => "EXIT",
            Self::THROTTLE => "THROTTLE",
            Self::UNTHROTTLE => "UNTHROTTLE",
            Self::FORK => "FORK",
            Self::READ => "READ",
            Self::SAMPLE => "SAMPLE",
            Self::MMAP2 => "MMAP2",
            Self::AUX => "AUX",
            Self::ITRACE_START => "ITRACE_START",
            Self::LOST_SAMPLES => "LOST_SAMPLES",
            Self::SWITCH => "SWITCH",
            Self::SWITCH_CPU_WIDE => "SWITCH_CPU_WIDE",
            Self::NAMESPACES => "NAMESPACES",
            Self::CGROUP => "CGROUP",
            Self::HEADER_ATTR => "HEADER_ATTR",
            Self::HEADER_EVENT_TYPE => "HEADER_EVENT_TYPE",
            Self::HEADER_TRACING_DATA => "HEADER_TRACING_DATA",
            Self::HEADER_BUILD_ID => "HEADER_BUILD_ID",
            Self::FINISHED_ROUND => "FINISHED_ROUND",
            Self::AUXTRACE_INFO => "AUXTRACE_INFO",
            Self::AUXTRACE => "AUXTRACE",
            Self::AUXTRACE_ERROR => "AUXTRACE_ERROR",
            Self::THREAD_MAP => "THREAD_MAP",
            Self::STAT_CONFIG => "STAT_CONFIG",
            Self::STAT => "STAT",
            Self::STAT_ROUND => "STAT_ROUND",
            Self::TIME_CONV => "TIME_CONV",
            Self::HEADER_FEATURE => "HEADER_FEATURE",
            _ => return write!(f, "Unknown({})", self.0),
        };
        f.write_str(name)
    }
}

/// The CPU mode bits of a record header's misc field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuMode {
    Unknown,
    Kernel,
    User,
    Hypervisor,
    GuestKernel,
    GuestUser,
}

impl CpuMode {
    pub fn from_misc(misc: u16) -> Self {
        match misc & PERF_RECORD_MISC_CPUMODE_MASK {
            PERF_RECORD_MISC_KERNEL => Self::Kernel,
            PERF_RECORD_MISC_USER => Self::User,
            PERF_RECORD_MISC_HYPERVISOR => Self::Hypervisor,
            PERF_RECORD_MISC_GUEST_KERNEL => Self::GuestKernel,
            PERF_RECORD_MISC_GUEST_USER => Self::GuestUser,
            _ => Self::Unknown,
        }
    }
}

bitflags! {
    /// `perf_event_attr.sample_type`: which fields a SAMPLE payload and the
    /// sample-info trailer carry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SampleFormat: u64 {
        const IP = PERF_SAMPLE_IP;
        const TID = PERF_SAMPLE_TID;
        const TIME = PERF_SAMPLE_TIME;
        const ADDR = PERF_SAMPLE_ADDR;
        const READ = PERF_SAMPLE_READ;
        const CALLCHAIN = PERF_SAMPLE_CALLCHAIN;
        const ID = PERF_SAMPLE_ID;
        const CPU = PERF_SAMPLE_CPU;
        const PERIOD = PERF_SAMPLE_PERIOD;
        const STREAM_ID = PERF_SAMPLE_STREAM_ID;
        const RAW = PERF_SAMPLE_RAW;
        const BRANCH_STACK = PERF_SAMPLE_BRANCH_STACK;
        const REGS_USER = PERF_SAMPLE_REGS_USER;
        const STACK_USER = PERF_SAMPLE_STACK_USER;
        const WEIGHT = PERF_SAMPLE_WEIGHT;
        const DATA_SRC = PERF_SAMPLE_DATA_SRC;
        const IDENTIFIER = PERF_SAMPLE_IDENTIFIER;
        const TRANSACTION = PERF_SAMPLE_TRANSACTION;
        const REGS_INTR = PERF_SAMPLE_REGS_INTR;
        const PHYS_ADDR = PERF_SAMPLE_PHYS_ADDR;
        const AUX = PERF_SAMPLE_AUX;
        const CGROUP = PERF_SAMPLE_CGROUP;
        const DATA_PAGE_SIZE = PERF_SAMPLE_DATA_PAGE_SIZE;
        const CODE_PAGE_SIZE = PERF_SAMPLE_CODE_PAGE_SIZE;
        const WEIGHT_STRUCT = PERF_SAMPLE_WEIGHT_STRUCT;
    }

    /// `perf_event_attr.read_format`: the shape of counter read values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ReadFormat: u64 {
        const TOTAL_TIME_ENABLED = PERF_FORMAT_TOTAL_TIME_ENABLED;
        const TOTAL_TIME_RUNNING = PERF_FORMAT_TOTAL_TIME_RUNNING;
        const ID = PERF_FORMAT_ID;
        const GROUP = PERF_FORMAT_GROUP;
        const LOST = PERF_FORMAT_LOST;
    }

    /// The flag bitfield of `perf_event_attr`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttrFlags: u64 {
        const DISABLED = ATTR_FLAG_BIT_DISABLED;
        const INHERIT = ATTR_FLAG_BIT_INHERIT;
        const PINNED = ATTR_FLAG_BIT_PINNED;
        const EXCLUSIVE = ATTR_FLAG_BIT_EXCLUSIVE;
        const EXCLUDE_USER = ATTR_FLAG_BIT_EXCLUDE_USER;
        const EXCLUDE_KERNEL = ATTR_FLAG_BIT_EXCLUDE_KERNEL;
        const EXCLUDE_HV = ATTR_FLAG_BIT_EXCLUDE_HV;
        const EXCLUDE_IDLE = ATTR_FLAG_BIT_EXCLUDE_IDLE;
        const MMAP = ATTR_FLAG_BIT_MMAP;
        const COMM = ATTR_FLAG_BIT_COMM;
        const FREQ = ATTR_FLAG_BIT_FREQ;
        const INHERIT_STAT = ATTR_FLAG_BIT_INHERIT_STAT;
        const ENABLE_ON_EXEC = ATTR_FLAG_BIT_ENABLE_ON_EXEC;
        const TASK = ATTR_FLAG_BIT_TASK;
        const WATERMARK = ATTR_FLAG_BIT_WATERMARK;
        const PRECISE_IP_BITMASK = ATTR_FLAG_BITMASK_PRECISE_IP;
        const MMAP_DATA = ATTR_FLAG_BIT_MMAP_DATA;
        const SAMPLE_ID_ALL = ATTR_FLAG_BIT_SAMPLE_ID_ALL;
        const EXCLUDE_HOST = ATTR_FLAG_BIT_EXCLUDE_HOST;
        const EXCLUDE_GUEST = ATTR_FLAG_BIT_EXCLUDE_GUEST;
        const EXCLUDE_CALLCHAIN_KERNEL = ATTR_FLAG_BIT_EXCLUDE_CALLCHAIN_KERNEL;
        const EXCLUDE_CALLCHAIN_USER = ATTR_FLAG_BIT_EXCLUDE_CALLCHAIN_USER;
        const MMAP2 = ATTR_FLAG_BIT_MMAP2;
        const COMM_EXEC = ATTR_FLAG_BIT_COMM_EXEC;
        const USE_CLOCKID = ATTR_FLAG_BIT_USE_CLOCKID;
        const CONTEXT_SWITCH = ATTR_FLAG_BIT_CONTEXT_SWITCH;
        const WRITE_BACKWARD = ATTR_FLAG_BIT_WRITE_BACKWARD;
        const NAMESPACES = ATTR_FLAG_BIT_NAMESPACES;
        const KSYMBOL = ATTR_FLAG_BIT_KSYMBOL;
        const BPF_EVENT = ATTR_FLAG_BIT_BPF_EVENT;
        const AUX_OUTPUT = ATTR_FLAG_BIT_AUX_OUTPUT;
        const CGROUP = ATTR_FLAG_BIT_CGROUP;
        const TEXT_POKE = ATTR_FLAG_BIT_TEXT_POKE;
        const BUILD_ID = ATTR_FLAG_BIT_BUILD_ID;
        const INHERIT_THREAD = ATTR_FLAG_BIT_INHERIT_THREAD;
        const REMOVE_ON_EXEC = ATTR_FLAG_BIT_REMOVE_ON_EXEC;
        const SIGTRAP = ATTR_FLAG_BIT_SIGTRAP;
    }

    /// `perf_event_attr.branch_sample_type`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BranchSampleFormat: u64 {
        const USER = PERF_SAMPLE_BRANCH_USER;
        const KERNEL = PERF_SAMPLE_BRANCH_KERNEL;
        const HV = PERF_SAMPLE_BRANCH_HV;
        const ANY = PERF_SAMPLE_BRANCH_ANY;
        const ANY_CALL = PERF_SAMPLE_BRANCH_ANY_CALL;
        const ANY_RETURN = PERF_SAMPLE_BRANCH_ANY_RETURN;
        const IND_CALL = PERF_SAMPLE_BRANCH_IND_CALL;
        const ABORT_TX = PERF_SAMPLE_BRANCH_ABORT_TX;
        const IN_TX = PERF_SAMPLE_BRANCH_IN_TX;
        const NO_TX = PERF_SAMPLE_BRANCH_NO_TX;
        const COND = PERF_SAMPLE_BRANCH_COND;
        const CALL_STACK = PERF_SAMPLE_BRANCH_CALL_STACK;
        const IND_JUMP = PERF_SAMPLE_BRANCH_IND_JUMP;
        const CALL = PERF_SAMPLE_BRANCH_CALL;
        const NO_FLAGS = PERF_SAMPLE_BRANCH_NO_FLAGS;
        const NO_CYCLES = PERF_SAMPLE_BRANCH_NO_CYCLES;
        const TYPE_SAVE = PERF_SAMPLE_BRANCH_TYPE_SAVE;
        const HW_INDEX = PERF_SAMPLE_BRANCH_HW_INDEX;
    }

    /// Breakpoint type for breakpoint events.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HwBreakpointType: u32 {
        const R = 1;
        const W = 2;
        const X = 4;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn record_type_classification() {
        assert!(RecordType::SAMPLE.is_kernel_type());
        assert!(RecordType::CGROUP.is_kernel_type());
        assert!(RecordType::FINISHED_ROUND.is_user_type());
        assert!(RecordType::TIME_CONV.is_user_type());
        assert!(!RecordType::SAMPLE.is_user_type());
    }

    #[test]
    fn cpu_mode_from_misc() {
        assert_eq!(CpuMode::from_misc(PERF_RECORD_MISC_KERNEL), CpuMode::Kernel);
        assert_eq!(
            CpuMode::from_misc(PERF_RECORD_MISC_USER | PERF_RECORD_MISC_EXACT_IP),
            CpuMode::User
        );
        assert_eq!(CpuMode::from_misc(0), CpuMode::Unknown);
    }
}
