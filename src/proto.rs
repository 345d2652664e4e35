//! The structured message form of a parsed profile.
//!
//! Downstream analysis pipelines consume these messages instead of raw
//! perf.data bytes. The schema mirrors the parsed model field by field;
//! resolved addresses appear as `(dso_name, offset, build_id)` triples next
//! to the raw addresses they were derived from.

/// A resolved address.
#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct DsoAndOffsetProto {
    #[prost(string, optional, tag = "1")]
    pub dso_name: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(uint64, optional, tag = "2")]
    pub offset: ::core::option::Option<u64>,
    /// Perfized hex build ID.
    #[prost(string, optional, tag = "3")]
    pub build_id: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct EventHeaderProto {
    #[prost(uint32, tag = "1")]
    pub r#type: u32,
    #[prost(uint32, tag = "2")]
    pub misc: u32,
    #[prost(uint32, tag = "3")]
    pub size: u32,
}

/// One event attribute with its routing IDs and display name.
#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct EventAttrProto {
    #[prost(uint32, tag = "1")]
    pub r#type: u32,
    #[prost(uint64, tag = "2")]
    pub config: u64,
    #[prost(uint64, tag = "3")]
    pub sample_type: u64,
    #[prost(uint64, tag = "4")]
    pub read_format: u64,
    #[prost(uint64, tag = "5")]
    pub sample_period_or_freq: u64,
    #[prost(bool, tag = "6")]
    pub freq: bool,
    #[prost(bool, tag = "7")]
    pub sample_id_all: bool,
    #[prost(bool, tag = "8")]
    pub exclude_kernel: bool,
    #[prost(uint32, tag = "9")]
    pub precise_ip: u32,
    #[prost(uint64, tag = "10")]
    pub branch_sample_type: u64,
    #[prost(string, optional, tag = "11")]
    pub name: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(uint64, repeated, tag = "12")]
    pub ids: ::prost::alloc::vec::Vec<u64>,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct MmapEventProto {
    #[prost(uint32, tag = "1")]
    pub pid: u32,
    #[prost(uint32, tag = "2")]
    pub tid: u32,
    #[prost(uint64, tag = "3")]
    pub start: u64,
    #[prost(uint64, tag = "4")]
    pub len: u64,
    #[prost(uint64, tag = "5")]
    pub pgoff: u64,
    #[prost(string, tag = "6")]
    pub filename: ::prost::alloc::string::String,
    #[prost(uint32, optional, tag = "7")]
    pub maj: ::core::option::Option<u32>,
    #[prost(uint32, optional, tag = "8")]
    pub min: ::core::option::Option<u32>,
    #[prost(uint64, optional, tag = "9")]
    pub ino: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "10")]
    pub ino_generation: ::core::option::Option<u64>,
    #[prost(uint32, optional, tag = "11")]
    pub prot: ::core::option::Option<u32>,
    #[prost(uint32, optional, tag = "12")]
    pub flags: ::core::option::Option<u32>,
    /// Hex build ID when the record carried one inline.
    #[prost(string, optional, tag = "13")]
    pub build_id: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct CommEventProto {
    #[prost(uint32, tag = "1")]
    pub pid: u32,
    #[prost(uint32, tag = "2")]
    pub tid: u32,
    #[prost(string, tag = "3")]
    pub comm: ::prost::alloc::string::String,
    #[prost(bool, tag = "4")]
    pub is_exec: bool,
}

/// FORK and EXIT share this shape; the header type tells them apart.
#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct ForkOrExitEventProto {
    #[prost(uint32, tag = "1")]
    pub pid: u32,
    #[prost(uint32, tag = "2")]
    pub ppid: u32,
    #[prost(uint32, tag = "3")]
    pub tid: u32,
    #[prost(uint32, tag = "4")]
    pub ptid: u32,
    #[prost(uint64, tag = "5")]
    pub time_ns: u64,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct LostEventProto {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(uint64, tag = "2")]
    pub lost: u64,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct ThrottleEventProto {
    #[prost(uint64, tag = "1")]
    pub time_ns: u64,
    #[prost(uint64, tag = "2")]
    pub id: u64,
    #[prost(uint64, tag = "3")]
    pub stream_id: u64,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct BranchStackEntryProto {
    #[prost(uint64, tag = "1")]
    pub from_ip: u64,
    #[prost(uint64, tag = "2")]
    pub to_ip: u64,
    #[prost(bool, tag = "3")]
    pub mispredicted: bool,
    #[prost(bool, tag = "4")]
    pub predicted: bool,
    #[prost(bool, tag = "5")]
    pub in_transaction: bool,
    #[prost(bool, tag = "6")]
    pub abort: bool,
    #[prost(uint32, tag = "7")]
    pub cycles: u32,
    #[prost(message, optional, tag = "8")]
    pub from_mapping: ::core::option::Option<DsoAndOffsetProto>,
    #[prost(message, optional, tag = "9")]
    pub to_mapping: ::core::option::Option<DsoAndOffsetProto>,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct SampleEventProto {
    #[prost(uint64, optional, tag = "1")]
    pub ip: ::core::option::Option<u64>,
    #[prost(uint32, optional, tag = "2")]
    pub pid: ::core::option::Option<u32>,
    #[prost(uint32, optional, tag = "3")]
    pub tid: ::core::option::Option<u32>,
    #[prost(uint64, optional, tag = "4")]
    pub sample_time_ns: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "5")]
    pub addr: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "6")]
    pub id: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "7")]
    pub stream_id: ::core::option::Option<u64>,
    #[prost(uint32, optional, tag = "8")]
    pub cpu: ::core::option::Option<u32>,
    #[prost(uint64, optional, tag = "9")]
    pub period: ::core::option::Option<u64>,
    #[prost(uint64, repeated, tag = "10")]
    pub callchain: ::prost::alloc::vec::Vec<u64>,
    #[prost(bytes, optional, tag = "11")]
    pub raw: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    #[prost(message, repeated, tag = "12")]
    pub branch_stack: ::prost::alloc::vec::Vec<BranchStackEntryProto>,
    #[prost(uint64, optional, tag = "13")]
    pub weight: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "14")]
    pub data_src: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "15")]
    pub transaction: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "16")]
    pub phys_addr: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "17")]
    pub cgroup: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "18")]
    pub data_page_size: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "19")]
    pub code_page_size: ::core::option::Option<u64>,
    /// Resolution of `ip` against the mappings live at sample time.
    #[prost(message, optional, tag = "20")]
    pub dso_and_offset: ::core::option::Option<DsoAndOffsetProto>,
    /// Resolution of `addr`, when the sample carried a non-zero one.
    #[prost(message, optional, tag = "21")]
    pub data_dso_and_offset: ::core::option::Option<DsoAndOffsetProto>,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct AuxEventProto {
    #[prost(uint64, tag = "1")]
    pub aux_offset: u64,
    #[prost(uint64, tag = "2")]
    pub aux_size: u64,
    #[prost(uint64, tag = "3")]
    pub flags: u64,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct ItraceStartEventProto {
    #[prost(uint32, tag = "1")]
    pub pid: u32,
    #[prost(uint32, tag = "2")]
    pub tid: u32,
}

/// SWITCH and SWITCH_CPU_WIDE. The plain form carries no payload of its
/// own; `is_out` comes from the header's misc bit.
#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct ContextSwitchEventProto {
    #[prost(bool, tag = "1")]
    pub is_out: bool,
    #[prost(uint32, optional, tag = "2")]
    pub next_prev_pid: ::core::option::Option<u32>,
    #[prost(uint32, optional, tag = "3")]
    pub next_prev_tid: ::core::option::Option<u32>,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct NamespacesEventProto {
    #[prost(uint32, tag = "1")]
    pub pid: u32,
    #[prost(uint32, tag = "2")]
    pub tid: u32,
    #[prost(uint64, repeated, tag = "3")]
    pub dev: ::prost::alloc::vec::Vec<u64>,
    #[prost(uint64, repeated, tag = "4")]
    pub ino: ::prost::alloc::vec::Vec<u64>,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct CgroupEventProto {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(string, tag = "2")]
    pub path: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct LostSamplesEventProto {
    #[prost(uint64, tag = "1")]
    pub lost: u64,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct AuxtraceEventProto {
    #[prost(uint64, tag = "1")]
    pub size: u64,
    #[prost(uint64, tag = "2")]
    pub offset: u64,
    #[prost(uint64, tag = "3")]
    pub reference: u64,
    #[prost(uint32, tag = "4")]
    pub idx: u32,
    #[prost(uint32, tag = "5")]
    pub tid: u32,
    #[prost(uint32, tag = "6")]
    pub cpu: u32,
    #[prost(bytes, tag = "7")]
    pub trace_data: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct AuxtraceErrorEventProto {
    #[prost(uint32, tag = "1")]
    pub r#type: u32,
    #[prost(uint32, tag = "2")]
    pub code: u32,
    #[prost(uint32, tag = "3")]
    pub cpu: u32,
    #[prost(uint32, tag = "4")]
    pub pid: u32,
    #[prost(uint32, tag = "5")]
    pub tid: u32,
    #[prost(uint64, tag = "6")]
    pub ip: u64,
    #[prost(string, tag = "7")]
    pub msg: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct AuxtraceInfoEventProto {
    #[prost(uint32, tag = "1")]
    pub r#type: u32,
    #[prost(uint64, repeated, tag = "2")]
    pub unparsed_binary_blob_priv_data: ::prost::alloc::vec::Vec<u64>,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct ThreadMapEntryProto {
    #[prost(uint64, tag = "1")]
    pub pid: u64,
    #[prost(string, tag = "2")]
    pub comm: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct ThreadMapEventProto {
    #[prost(message, repeated, tag = "1")]
    pub entries: ::prost::alloc::vec::Vec<ThreadMapEntryProto>,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct StatConfigEventProto {
    #[prost(uint64, repeated, tag = "1")]
    pub tag: ::prost::alloc::vec::Vec<u64>,
    #[prost(uint64, repeated, tag = "2")]
    pub val: ::prost::alloc::vec::Vec<u64>,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct StatEventProto {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(uint32, tag = "2")]
    pub cpu: u32,
    #[prost(uint32, tag = "3")]
    pub thread: u32,
    #[prost(uint64, tag = "4")]
    pub value: u64,
    #[prost(uint64, tag = "5")]
    pub enabled: u64,
    #[prost(uint64, tag = "6")]
    pub running: u64,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct StatRoundEventProto {
    #[prost(uint64, tag = "1")]
    pub r#type: u64,
    #[prost(uint64, tag = "2")]
    pub time_ns: u64,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct TimeConvEventProto {
    #[prost(uint64, tag = "1")]
    pub time_shift: u64,
    #[prost(uint64, tag = "2")]
    pub time_mult: u64,
    #[prost(uint64, tag = "3")]
    pub time_zero: u64,
    #[prost(uint64, optional, tag = "4")]
    pub time_cycles: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "5")]
    pub time_mask: ::core::option::Option<u64>,
    #[prost(bool, optional, tag = "6")]
    pub cap_user_time_zero: ::core::option::Option<bool>,
    #[prost(bool, optional, tag = "7")]
    pub cap_user_time_short: ::core::option::Option<bool>,
}

/// One event of the output sequence.
#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct PerfEventProto {
    #[prost(message, optional, tag = "1")]
    pub header: ::core::option::Option<EventHeaderProto>,
    /// Timestamp from the sample payload or the sample-info trailer.
    #[prost(uint64, optional, tag = "2")]
    pub timestamp_ns: ::core::option::Option<u64>,
    #[prost(
        oneof = "PerfEventTypedProto",
        tags = "3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23"
    )]
    pub event: ::core::option::Option<PerfEventTypedProto>,
}

#[derive(Clone, PartialEq, ::prost_derive::Oneof)]
pub enum PerfEventTypedProto {
    #[prost(message, tag = "3")]
    MmapEvent(MmapEventProto),
    #[prost(message, tag = "4")]
    SampleEvent(SampleEventProto),
    #[prost(message, tag = "5")]
    CommEvent(CommEventProto),
    /// FORK and EXIT, distinguished by the header type.
    #[prost(message, tag = "6")]
    ForkEvent(ForkOrExitEventProto),
    #[prost(message, tag = "7")]
    ExitEvent(ForkOrExitEventProto),
    #[prost(message, tag = "8")]
    LostEvent(LostEventProto),
    #[prost(message, tag = "9")]
    ThrottleEvent(ThrottleEventProto),
    #[prost(message, tag = "10")]
    AuxEvent(AuxEventProto),
    #[prost(message, tag = "11")]
    ItraceStartEvent(ItraceStartEventProto),
    #[prost(message, tag = "12")]
    ContextSwitchEvent(ContextSwitchEventProto),
    #[prost(message, tag = "13")]
    NamespacesEvent(NamespacesEventProto),
    #[prost(message, tag = "14")]
    CgroupEvent(CgroupEventProto),
    #[prost(message, tag = "15")]
    LostSamplesEvent(LostSamplesEventProto),
    #[prost(message, tag = "16")]
    AuxtraceEvent(AuxtraceEventProto),
    #[prost(message, tag = "17")]
    AuxtraceErrorEvent(AuxtraceErrorEventProto),
    #[prost(message, tag = "18")]
    AuxtraceInfoEvent(AuxtraceInfoEventProto),
    #[prost(message, tag = "19")]
    ThreadMapEvent(ThreadMapEventProto),
    #[prost(message, tag = "20")]
    StatEvent(StatEventProto),
    #[prost(message, tag = "21")]
    StatConfigEvent(StatConfigEventProto),
    #[prost(message, tag = "22")]
    StatRoundEvent(StatRoundEventProto),
    #[prost(message, tag = "23")]
    TimeConvEvent(TimeConvEventProto),
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct BuildIdProto {
    #[prost(uint32, tag = "1")]
    pub misc: u32,
    #[prost(sint32, tag = "2")]
    pub pid: i32,
    #[prost(string, tag = "3")]
    pub filename: ::prost::alloc::string::String,
    /// Perfized hex build ID.
    #[prost(string, tag = "4")]
    pub build_id_hash: ::prost::alloc::string::String,
    #[prost(bool, tag = "5")]
    pub is_injected: bool,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct StatsProto {
    #[prost(uint64, tag = "1")]
    pub num_mmap_events: u64,
    #[prost(uint64, tag = "2")]
    pub num_sample_events: u64,
    #[prost(uint64, tag = "3")]
    pub num_sample_events_mapped: u64,
    #[prost(uint64, tag = "4")]
    pub num_data_sample_events: u64,
    #[prost(uint64, tag = "5")]
    pub num_data_sample_events_mapped: u64,
    #[prost(bool, tag = "6")]
    pub did_remap: bool,
}

#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct StringMetadataProto {
    #[prost(string, optional, tag = "1")]
    pub hostname: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "2")]
    pub os_release: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "3")]
    pub perf_version: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "4")]
    pub architecture: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "5")]
    pub cpu_description: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "6")]
    pub cpu_id: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, repeated, tag = "7")]
    pub perf_command_line_token: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(uint64, optional, tag = "8")]
    pub total_mem_kb: ::core::option::Option<u64>,
    #[prost(uint32, optional, tag = "9")]
    pub nr_cpus_available: ::core::option::Option<u32>,
    #[prost(uint32, optional, tag = "10")]
    pub nr_cpus_online: ::core::option::Option<u32>,
}

/// The whole profile: attributes, events in output order, build IDs,
/// metadata, and the parse statistics.
#[derive(Clone, PartialEq, ::prost_derive::Message)]
pub struct PerfDataProto {
    #[prost(message, repeated, tag = "1")]
    pub file_attrs: ::prost::alloc::vec::Vec<EventAttrProto>,
    #[prost(message, repeated, tag = "2")]
    pub events: ::prost::alloc::vec::Vec<PerfEventProto>,
    #[prost(message, repeated, tag = "3")]
    pub build_ids: ::prost::alloc::vec::Vec<BuildIdProto>,
    #[prost(message, optional, tag = "4")]
    pub stats: ::core::option::Option<StatsProto>,
    #[prost(message, optional, tag = "5")]
    pub string_metadata: ::core::option::Option<StringMetadataProto>,
}
