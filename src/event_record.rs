use crate::attr::EventAttr;
use crate::buffer::{pad8, ByteReader, ByteWriter};
use crate::constants::MAX_AUXTRACE_ERROR_MSG;
use crate::error::Error;
use crate::sample::SampleRecord;
use crate::sample_info::{SampleInfo, SampleInfoCodec};
use crate::types::RecordType;

/// `PERF_RECORD_MMAP`: a new executable mapping. Modern kernels emit MMAP2
/// instead, but perf still synthesizes plain MMAP records for the kernel
/// image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MmapRecord {
    pub pid: u32,
    pub tid: u32,
    pub addr: u64,
    pub len: u64,
    pub pgoff: u64,
    pub filename: Vec<u8>,
}

/// The 24-byte union inside MMAP2: either device/inode identification or,
/// when `PERF_RECORD_MISC_MMAP_BUILD_ID` is set in misc, an inline build ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mmap2FileId {
    InodeAndVersion {
        maj: u32,
        min: u32,
        ino: u64,
        ino_generation: u64,
    },
    BuildId(Vec<u8>),
}

/// `PERF_RECORD_MMAP2`: MMAP plus file identification and protection bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mmap2Record {
    pub pid: u32,
    pub tid: u32,
    pub addr: u64,
    pub len: u64,
    pub pgoff: u64,
    pub file_id: Mmap2FileId,
    pub prot: u32,
    pub flags: u32,
    pub filename: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommRecord {
    pub pid: u32,
    pub tid: u32,
    pub comm: Vec<u8>,
}

/// Payload shared by FORK and EXIT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkOrExitRecord {
    pub pid: u32,
    pub ppid: u32,
    pub tid: u32,
    pub ptid: u32,
    pub time: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LostRecord {
    pub id: u64,
    pub lost: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LostSamplesRecord {
    pub lost: u64,
}

/// Payload shared by THROTTLE and UNTHROTTLE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleRecord {
    pub time: u64,
    pub id: u64,
    pub stream_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuxRecord {
    pub aux_offset: u64,
    pub aux_size: u64,
    pub flags: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItraceStartRecord {
    pub pid: u32,
    pub tid: u32,
}

/// `PERF_RECORD_SWITCH_CPU_WIDE` payload. The plain SWITCH record has no
/// payload at all; both carry their direction in the misc bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchCpuWideRecord {
    pub next_prev_pid: u32,
    pub next_prev_tid: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceEntry {
    pub dev: u64,
    pub ino: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacesRecord {
    pub pid: u32,
    pub tid: u32,
    pub namespaces: Vec<NamespaceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgroupRecord {
    pub id: u64,
    pub path: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxtraceInfoRecord {
    pub type_: u32,
    /// Opaque per-tracer words; the count is whatever fills the record.
    pub priv_: Vec<u64>,
}

/// `PERF_RECORD_AUXTRACE`: immediately followed in the stream by `size`
/// bytes of trace data that are not counted in `header.size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxtraceRecord {
    pub size: u64,
    pub offset: u64,
    pub reference: u64,
    pub idx: u32,
    pub tid: u32,
    pub cpu: u32,
    pub trace_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxtraceErrorRecord {
    pub type_: u32,
    pub code: u32,
    pub cpu: u32,
    pub pid: u32,
    pub tid: u32,
    pub ip: u64,
    /// Truncated to `MAX_AUXTRACE_ERROR_MSG` bytes on the wire.
    pub msg: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMapEntry {
    pub pid: u64,
    pub comm: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMapRecord {
    pub entries: Vec<ThreadMapEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatConfigEntry {
    pub tag: u64,
    pub val: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatConfigRecord {
    pub entries: Vec<StatConfigEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatRecord {
    pub id: u64,
    pub cpu: u32,
    pub thread: u32,
    pub val: u64,
    pub ena: u64,
    pub run: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatRoundRecord {
    pub type_: u64,
    pub time: u64,
}

/// `PERF_RECORD_TIME_CONV`. The record exists in a short three-field form
/// and a longer form with cycle/mask information; `header.size` is the only
/// discriminator between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeConvRecord {
    pub time_shift: u64,
    pub time_mult: u64,
    pub time_zero: u64,
    pub extended: Option<TimeConvExtension>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeConvExtension {
    pub time_cycles: u64,
    pub time_mask: u64,
    pub cap_user_time_zero: bool,
    pub cap_user_time_short: bool,
}

impl TimeConvRecord {
    pub const SHORT_SIZE: usize = 8 + 24;
    pub const FULL_SIZE: usize = 8 + 24 + 16 + 8;
}

/// The decoded payload of one record, one variant per supported type.
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    Mmap(MmapRecord),
    Mmap2(Mmap2Record),
    Comm(CommRecord),
    Exit(ForkOrExitRecord),
    Fork(ForkOrExitRecord),
    Lost(LostRecord),
    LostSamples(LostSamplesRecord),
    Throttle(ThrottleRecord),
    Unthrottle(ThrottleRecord),
    Sample(SampleRecord),
    Aux(AuxRecord),
    ItraceStart(ItraceStartRecord),
    Switch,
    SwitchCpuWide(SwitchCpuWideRecord),
    Namespaces(NamespacesRecord),
    Cgroup(CgroupRecord),
    FinishedRound,
    AuxtraceInfo(AuxtraceInfoRecord),
    Auxtrace(AuxtraceRecord),
    AuxtraceError(AuxtraceErrorRecord),
    ThreadMap(ThreadMapRecord),
    StatConfig(StatConfigRecord),
    Stat(StatRecord),
    StatRound(StatRoundRecord),
    TimeConv(TimeConvRecord),
}

impl EventData {
    pub fn record_type(&self) -> RecordType {
        match self {
            EventData::Mmap(_) => RecordType::MMAP,
            EventData::Mmap2(_) => RecordType::MMAP2,
            EventData::Comm(_) => RecordType::COMM,
            EventData::Exit(_) => RecordType::EXIT,
            EventData::Fork(_) => RecordType::FORK,
            EventData::Lost(_) => RecordType::LOST,
            EventData::LostSamples(_) => RecordType::LOST_SAMPLES,
            EventData::Throttle(_) => RecordType::THROTTLE,
            EventData::Unthrottle(_) => RecordType::UNTHROTTLE,
            EventData::Sample(_) => RecordType::SAMPLE,
            EventData::Aux(_) => RecordType::AUX,
            EventData::ItraceStart(_) => RecordType::ITRACE_START,
            EventData::Switch => RecordType::SWITCH,
            EventData::SwitchCpuWide(_) => RecordType::SWITCH_CPU_WIDE,
            EventData::Namespaces(_) => RecordType::NAMESPACES,
            EventData::Cgroup(_) => RecordType::CGROUP,
            EventData::FinishedRound => RecordType::FINISHED_ROUND,
            EventData::AuxtraceInfo(_) => RecordType::AUXTRACE_INFO,
            EventData::Auxtrace(_) => RecordType::AUXTRACE,
            EventData::AuxtraceError(_) => RecordType::AUXTRACE_ERROR,
            EventData::ThreadMap(_) => RecordType::THREAD_MAP,
            EventData::StatConfig(_) => RecordType::STAT_CONFIG,
            EventData::Stat(_) => RecordType::STAT,
            EventData::StatRound(_) => RecordType::STAT_ROUND,
            EventData::TimeConv(_) => RecordType::TIME_CONV,
        }
    }

    /// Whether records of this type embed a sample-info trailer when the
    /// owning attribute has `sample_id_all`. SAMPLE carries its metadata
    /// inline and user-synthesized records never have a trailer.
    pub fn embeds_sample_info(record_type: RecordType) -> bool {
        record_type.is_kernel_type() && record_type != RecordType::SAMPLE
    }

    /// The size of the fixed payload of `record_type`, without header,
    /// variable parts or trailer. `None` for unrecognized types.
    pub fn fixed_payload_size(record_type: RecordType) -> Option<usize> {
        let size = match record_type {
            RecordType::MMAP => 8 + 24,
            RecordType::MMAP2 => 8 + 24 + 24 + 8,
            RecordType::COMM => 8,
            RecordType::EXIT | RecordType::FORK => 16 + 8,
            RecordType::LOST => 16,
            RecordType::LOST_SAMPLES => 8,
            RecordType::THROTTLE | RecordType::UNTHROTTLE => 24,
            RecordType::SAMPLE => 0,
            RecordType::AUX => 24,
            RecordType::ITRACE_START => 8,
            RecordType::SWITCH => 0,
            RecordType::SWITCH_CPU_WIDE => 8,
            RecordType::NAMESPACES => 8 + 8,
            RecordType::CGROUP => 8,
            RecordType::FINISHED_ROUND => 0,
            RecordType::AUXTRACE_INFO => 8,
            RecordType::AUXTRACE => 40,
            RecordType::AUXTRACE_ERROR => 24 + 8,
            RecordType::THREAD_MAP => 8,
            RecordType::STAT_CONFIG => 8,
            RecordType::STAT => 40,
            RecordType::STAT_ROUND => 16,
            RecordType::TIME_CONV => 24,
            _ => return None,
        };
        Some(size)
    }

    /// Parse one record body.
    ///
    /// `reader` must cover exactly the `header.size - 8` bytes of the body;
    /// `trailer_size` says how many bytes at the end belong to the
    /// sample-info trailer (0 when the type embeds none or `sample_id_all`
    /// is off). Types whose variable payload is delimited only by the record
    /// size (strings, AUXTRACE_INFO's private words) need it to know where
    /// their data stops.
    pub fn parse(
        record_type: RecordType,
        misc: u16,
        reader: &mut ByteReader,
        attr: &EventAttr,
        trailer_size: usize,
    ) -> Result<Self, Error> {
        let body_size = reader.size();
        if let Some(fixed) = Self::fixed_payload_size(record_type) {
            if body_size < fixed + trailer_size {
                return Err(Error::Malformed("record smaller than its fixed payload"));
            }
        }
        let variable_end = body_size - trailer_size;

        let data = match record_type {
            RecordType::MMAP => {
                let pid = reader.read_u32()?;
                let tid = reader.read_u32()?;
                let addr = reader.read_u64()?;
                let len = reader.read_u64()?;
                let pgoff = reader.read_u64()?;
                let filename = reader.read_string_padded(variable_end - reader.tell())?;
                EventData::Mmap(MmapRecord {
                    pid,
                    tid,
                    addr,
                    len,
                    pgoff,
                    filename: filename.to_vec(),
                })
            }
            RecordType::MMAP2 => {
                let pid = reader.read_u32()?;
                let tid = reader.read_u32()?;
                let addr = reader.read_u64()?;
                let len = reader.read_u64()?;
                let pgoff = reader.read_u64()?;
                let file_id = if misc & crate::constants::PERF_RECORD_MISC_MMAP_BUILD_ID != 0 {
                    let build_id_size = reader.read_u8()?;
                    if build_id_size > 20 {
                        return Err(Error::Malformed("MMAP2 build ID longer than 20 bytes"));
                    }
                    let _reserved1 = reader.read_u8()?;
                    let _reserved2 = reader.read_u16()?;
                    let bytes = reader.read_bytes(20)?;
                    Mmap2FileId::BuildId(bytes[..build_id_size as usize].to_vec())
                } else {
                    let maj = reader.read_u32()?;
                    let min = reader.read_u32()?;
                    let ino = reader.read_u64()?;
                    let ino_generation = reader.read_u64()?;
                    Mmap2FileId::InodeAndVersion {
                        maj,
                        min,
                        ino,
                        ino_generation,
                    }
                };
                let prot = reader.read_u32()?;
                let flags = reader.read_u32()?;
                let filename = reader.read_string_padded(variable_end - reader.tell())?;
                EventData::Mmap2(Mmap2Record {
                    pid,
                    tid,
                    addr,
                    len,
                    pgoff,
                    file_id,
                    prot,
                    flags,
                    filename: filename.to_vec(),
                })
            }
            RecordType::COMM => {
                let pid = reader.read_u32()?;
                let tid = reader.read_u32()?;
                let comm = reader.read_string_padded(variable_end - reader.tell())?;
                EventData::Comm(CommRecord {
                    pid,
                    tid,
                    comm: comm.to_vec(),
                })
            }
            RecordType::EXIT | RecordType::FORK => {
                let pid = reader.read_u32()?;
                let ppid = reader.read_u32()?;
                let tid = reader.read_u32()?;
                let ptid = reader.read_u32()?;
                let time = reader.read_u64()?;
                let record = ForkOrExitRecord {
                    pid,
                    ppid,
                    tid,
                    ptid,
                    time,
                };
                if record_type == RecordType::EXIT {
                    EventData::Exit(record)
                } else {
                    EventData::Fork(record)
                }
            }
            RecordType::LOST => EventData::Lost(LostRecord {
                id: reader.read_u64()?,
                lost: reader.read_u64()?,
            }),
            RecordType::LOST_SAMPLES => EventData::LostSamples(LostSamplesRecord {
                lost: reader.read_u64()?,
            }),
            RecordType::THROTTLE | RecordType::UNTHROTTLE => {
                let record = ThrottleRecord {
                    time: reader.read_u64()?,
                    id: reader.read_u64()?,
                    stream_id: reader.read_u64()?,
                };
                if record_type == RecordType::THROTTLE {
                    EventData::Throttle(record)
                } else {
                    EventData::Unthrottle(record)
                }
            }
            RecordType::SAMPLE => EventData::Sample(SampleRecord::parse(reader, attr)?),
            RecordType::AUX => EventData::Aux(AuxRecord {
                aux_offset: reader.read_u64()?,
                aux_size: reader.read_u64()?,
                flags: reader.read_u64()?,
            }),
            RecordType::ITRACE_START => EventData::ItraceStart(ItraceStartRecord {
                pid: reader.read_u32()?,
                tid: reader.read_u32()?,
            }),
            RecordType::SWITCH => EventData::Switch,
            RecordType::SWITCH_CPU_WIDE => EventData::SwitchCpuWide(SwitchCpuWideRecord {
                next_prev_pid: reader.read_u32()?,
                next_prev_tid: reader.read_u32()?,
            }),
            RecordType::NAMESPACES => {
                let pid = reader.read_u32()?;
                let tid = reader.read_u32()?;
                let nr_namespaces = reader.read_u64()?;
                if nr_namespaces as usize > (variable_end - reader.tell()) / 16 {
                    return Err(Error::Truncated("namespace entries"));
                }
                let mut namespaces = Vec::with_capacity(nr_namespaces as usize);
                for _ in 0..nr_namespaces {
                    namespaces.push(NamespaceEntry {
                        dev: reader.read_u64()?,
                        ino: reader.read_u64()?,
                    });
                }
                EventData::Namespaces(NamespacesRecord {
                    pid,
                    tid,
                    namespaces,
                })
            }
            RecordType::CGROUP => {
                let id = reader.read_u64()?;
                let path = reader.read_string_padded(variable_end - reader.tell())?;
                EventData::Cgroup(CgroupRecord {
                    id,
                    path: path.to_vec(),
                })
            }
            RecordType::FINISHED_ROUND => EventData::FinishedRound,
            RecordType::AUXTRACE_INFO => {
                let type_ = reader.read_u32()?;
                let _reserved = reader.read_u32()?;
                // The private words fill the rest of the record.
                let count = (variable_end - reader.tell()) / 8;
                let mut priv_ = Vec::with_capacity(count);
                for _ in 0..count {
                    priv_.push(reader.read_u64()?);
                }
                EventData::AuxtraceInfo(AuxtraceInfoRecord { type_, priv_ })
            }
            RecordType::AUXTRACE => {
                let size = reader.read_u64()?;
                let offset = reader.read_u64()?;
                let reference = reader.read_u64()?;
                let idx = reader.read_u32()?;
                let tid = reader.read_u32()?;
                let cpu = reader.read_u32()?;
                let _reserved = reader.read_u32()?;
                // The trace bytes follow the record in the stream; the
                // caller reads them and fills `trace_data` in.
                EventData::Auxtrace(AuxtraceRecord {
                    size,
                    offset,
                    reference,
                    idx,
                    tid,
                    cpu,
                    trace_data: Vec::new(),
                })
            }
            RecordType::AUXTRACE_ERROR => {
                let type_ = reader.read_u32()?;
                let code = reader.read_u32()?;
                let cpu = reader.read_u32()?;
                let pid = reader.read_u32()?;
                let tid = reader.read_u32()?;
                let _reserved = reader.read_u32()?;
                let ip = reader.read_u64()?;
                let msg = reader.read_string_padded(variable_end - reader.tell())?;
                EventData::AuxtraceError(AuxtraceErrorRecord {
                    type_,
                    code,
                    cpu,
                    pid,
                    tid,
                    ip,
                    msg: msg[..msg.len().min(MAX_AUXTRACE_ERROR_MSG)].to_vec(),
                })
            }
            RecordType::THREAD_MAP => {
                let nr = reader.read_u64()?;
                if nr as usize > (variable_end - reader.tell()) / 24 {
                    return Err(Error::Truncated("thread map entries"));
                }
                let mut entries = Vec::with_capacity(nr as usize);
                for _ in 0..nr {
                    let pid = reader.read_u64()?;
                    let comm = reader.read_string_padded(16)?;
                    entries.push(ThreadMapEntry {
                        pid,
                        comm: comm.to_vec(),
                    });
                }
                EventData::ThreadMap(ThreadMapRecord { entries })
            }
            RecordType::STAT_CONFIG => {
                let nr = reader.read_u64()?;
                if nr as usize > (variable_end - reader.tell()) / 16 {
                    return Err(Error::Truncated("stat config entries"));
                }
                let mut entries = Vec::with_capacity(nr as usize);
                for _ in 0..nr {
                    entries.push(StatConfigEntry {
                        tag: reader.read_u64()?,
                        val: reader.read_u64()?,
                    });
                }
                EventData::StatConfig(StatConfigRecord { entries })
            }
            RecordType::STAT => EventData::Stat(StatRecord {
                id: reader.read_u64()?,
                cpu: reader.read_u32()?,
                thread: reader.read_u32()?,
                val: reader.read_u64()?,
                ena: reader.read_u64()?,
                run: reader.read_u64()?,
            }),
            RecordType::STAT_ROUND => EventData::StatRound(StatRoundRecord {
                type_: reader.read_u64()?,
                time: reader.read_u64()?,
            }),
            RecordType::TIME_CONV => {
                let time_shift = reader.read_u64()?;
                let time_mult = reader.read_u64()?;
                let time_zero = reader.read_u64()?;
                // The long form is recognized purely by the record size.
                let extended = if body_size + 8 >= TimeConvRecord::FULL_SIZE {
                    let time_cycles = reader.read_u64()?;
                    let time_mask = reader.read_u64()?;
                    let cap_user_time_zero = reader.read_u8()? != 0;
                    let cap_user_time_short = reader.read_u8()? != 0;
                    reader.skip(6)?;
                    Some(TimeConvExtension {
                        time_cycles,
                        time_mask,
                        cap_user_time_zero,
                        cap_user_time_short,
                    })
                } else {
                    None
                };
                EventData::TimeConv(TimeConvRecord {
                    time_shift,
                    time_mult,
                    time_zero,
                    extended,
                })
            }
            _ => return Err(Error::Malformed("unsupported record type")),
        };

        // Everything between the parsed payload and the trailer must be
        // accounted for; a leftover means the size lied.
        if reader.tell() != variable_end {
            return Err(Error::SizeMismatch {
                record_type: record_type.0,
                header_size: body_size + 8,
                computed_size: reader.tell() + trailer_size + 8,
            });
        }

        Ok(data)
    }

    /// Serialize this record's body (everything after the 8-byte header,
    /// before the trailer).
    pub fn write(&self, writer: &mut ByteWriter, attr: &EventAttr) {
        match self {
            EventData::Mmap(mmap) => {
                writer.write_u32(mmap.pid);
                writer.write_u32(mmap.tid);
                writer.write_u64(mmap.addr);
                writer.write_u64(mmap.len);
                writer.write_u64(mmap.pgoff);
                writer.write_string_padded(&mmap.filename, pad8(mmap.filename.len() + 1));
            }
            EventData::Mmap2(mmap) => {
                writer.write_u32(mmap.pid);
                writer.write_u32(mmap.tid);
                writer.write_u64(mmap.addr);
                writer.write_u64(mmap.len);
                writer.write_u64(mmap.pgoff);
                match &mmap.file_id {
                    Mmap2FileId::BuildId(build_id) => {
                        writer.write_u8(build_id.len() as u8);
                        writer.write_u8(0);
                        writer.write_u16(0);
                        writer.write_bytes(build_id);
                        writer.write_zeros(20 - build_id.len());
                    }
                    Mmap2FileId::InodeAndVersion {
                        maj,
                        min,
                        ino,
                        ino_generation,
                    } => {
                        writer.write_u32(*maj);
                        writer.write_u32(*min);
                        writer.write_u64(*ino);
                        writer.write_u64(*ino_generation);
                    }
                }
                writer.write_u32(mmap.prot);
                writer.write_u32(mmap.flags);
                writer.write_string_padded(&mmap.filename, pad8(mmap.filename.len() + 1));
            }
            EventData::Comm(comm) => {
                writer.write_u32(comm.pid);
                writer.write_u32(comm.tid);
                writer.write_string_padded(&comm.comm, pad8(comm.comm.len() + 1));
            }
            EventData::Exit(record) | EventData::Fork(record) => {
                writer.write_u32(record.pid);
                writer.write_u32(record.ppid);
                writer.write_u32(record.tid);
                writer.write_u32(record.ptid);
                writer.write_u64(record.time);
            }
            EventData::Lost(record) => {
                writer.write_u64(record.id);
                writer.write_u64(record.lost);
            }
            EventData::LostSamples(record) => {
                writer.write_u64(record.lost);
            }
            EventData::Throttle(record) | EventData::Unthrottle(record) => {
                writer.write_u64(record.time);
                writer.write_u64(record.id);
                writer.write_u64(record.stream_id);
            }
            EventData::Sample(sample) => sample.write(writer, attr),
            EventData::Aux(record) => {
                writer.write_u64(record.aux_offset);
                writer.write_u64(record.aux_size);
                writer.write_u64(record.flags);
            }
            EventData::ItraceStart(record) => {
                writer.write_u32(record.pid);
                writer.write_u32(record.tid);
            }
            EventData::Switch => {}
            EventData::SwitchCpuWide(record) => {
                writer.write_u32(record.next_prev_pid);
                writer.write_u32(record.next_prev_tid);
            }
            EventData::Namespaces(record) => {
                writer.write_u32(record.pid);
                writer.write_u32(record.tid);
                writer.write_u64(record.namespaces.len() as u64);
                for entry in &record.namespaces {
                    writer.write_u64(entry.dev);
                    writer.write_u64(entry.ino);
                }
            }
            EventData::Cgroup(record) => {
                writer.write_u64(record.id);
                writer.write_string_padded(&record.path, pad8(record.path.len() + 1));
            }
            EventData::FinishedRound => {}
            EventData::AuxtraceInfo(record) => {
                writer.write_u32(record.type_);
                writer.write_u32(0);
                for word in &record.priv_ {
                    writer.write_u64(*word);
                }
            }
            EventData::Auxtrace(record) => {
                writer.write_u64(record.size);
                writer.write_u64(record.offset);
                writer.write_u64(record.reference);
                writer.write_u32(record.idx);
                writer.write_u32(record.tid);
                writer.write_u32(record.cpu);
                writer.write_u32(0);
            }
            EventData::AuxtraceError(record) => {
                writer.write_u32(record.type_);
                writer.write_u32(record.code);
                writer.write_u32(record.cpu);
                writer.write_u32(record.pid);
                writer.write_u32(record.tid);
                writer.write_u32(0);
                writer.write_u64(record.ip);
                let len = record.msg.len().min(MAX_AUXTRACE_ERROR_MSG - 1);
                writer.write_string_padded(&record.msg[..len], pad8(len + 1));
            }
            EventData::ThreadMap(record) => {
                writer.write_u64(record.entries.len() as u64);
                for entry in &record.entries {
                    writer.write_u64(entry.pid);
                    let len = entry.comm.len().min(15);
                    writer.write_string_padded(&entry.comm[..len], 16);
                }
            }
            EventData::StatConfig(record) => {
                writer.write_u64(record.entries.len() as u64);
                for entry in &record.entries {
                    writer.write_u64(entry.tag);
                    writer.write_u64(entry.val);
                }
            }
            EventData::Stat(record) => {
                writer.write_u64(record.id);
                writer.write_u32(record.cpu);
                writer.write_u32(record.thread);
                writer.write_u64(record.val);
                writer.write_u64(record.ena);
                writer.write_u64(record.run);
            }
            EventData::StatRound(record) => {
                writer.write_u64(record.type_);
                writer.write_u64(record.time);
            }
            EventData::TimeConv(record) => {
                writer.write_u64(record.time_shift);
                writer.write_u64(record.time_mult);
                writer.write_u64(record.time_zero);
                if let Some(ext) = &record.extended {
                    writer.write_u64(ext.time_cycles);
                    writer.write_u64(ext.time_mask);
                    writer.write_u8(ext.cap_user_time_zero as u8);
                    writer.write_u8(ext.cap_user_time_short as u8);
                    writer.write_zeros(6);
                }
            }
        }
    }
}

/// A fully decoded record: header bits, typed payload, and the sample-info
/// trailer if the record carried one.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub misc: u16,
    pub data: EventData,
    pub sample_info: Option<SampleInfo>,
    /// Index into the reader's attribute list of the attribute this record
    /// belongs to.
    pub attr_index: usize,
}

impl Event {
    pub fn record_type(&self) -> RecordType {
        self.data.record_type()
    }

    /// The timestamp of this record: the SAMPLE payload's time, or the
    /// trailer's.
    pub fn timestamp(&self) -> Option<u64> {
        match &self.data {
            EventData::Sample(sample) => sample.time,
            _ => self.sample_info.and_then(|info| info.time),
        }
    }

    /// Serialize the whole record (header, body, trailer) and return the
    /// byte size written. The header size field is recomputed from the
    /// actual payload, since transformations may have changed it.
    pub fn write(&self, writer: &mut ByteWriter, attr: &EventAttr) -> usize {
        let start = writer.tell();
        writer.write_u32(self.record_type().0);
        writer.write_u16(self.misc);
        let size_pos = writer.tell();
        writer.write_u16(0);
        self.data.write(writer, attr);
        if let Some(info) = &self.sample_info {
            SampleInfoCodec::new(attr).write(writer, info);
        }
        let size = writer.tell() - start;
        writer.patch_u16(size_pos, size as u16);
        // AUXTRACE trace bytes follow the record without being counted in
        // its header size.
        if let EventData::Auxtrace(auxtrace) = &self.data {
            writer.write_bytes(&auxtrace.trace_data);
        }
        size
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::endian::Endianness;
    use crate::types::{
        AttrFlags, BranchSampleFormat, HwBreakpointType, ReadFormat, SampleFormat,
    };

    fn plain_attr() -> EventAttr {
        EventAttr {
            type_: 0,
            size: EventAttr::CURRENT_SIZE,
            config: 0,
            sample_period_or_freq: 0,
            sample_format: SampleFormat::empty(),
            read_format: ReadFormat::empty(),
            flags: AttrFlags::empty(),
            wakeup_events_or_watermark: 0,
            bp_type: HwBreakpointType::empty(),
            bp_addr_or_config1: 0,
            bp_len_or_config2: 0,
            branch_sample_format: BranchSampleFormat::empty(),
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

    fn round_trip(event: &Event, attr: &EventAttr) -> Event {
        let mut w = ByteWriter::new(Endianness::LittleEndian);
        event.write(&mut w, attr);
        let buf = w.into_vec();
        let mut header = ByteReader::new(&buf, Endianness::LittleEndian);
        let type_ = header.read_u32().unwrap();
        let misc = header.read_u16().unwrap();
        let size = header.read_u16().unwrap() as usize;
        let body = &buf[8..size];
        let mut reader = ByteReader::new(body, Endianness::LittleEndian);
        let data = EventData::parse(
            RecordType(type_),
            misc,
            &mut reader,
            attr,
            0,
        )
        .unwrap();
        Event {
            misc,
            data,
            sample_info: None,
            attr_index: 0,
        }
    }

    #[test]
    fn mmap2_inode_round_trip() {
        let event = Event {
            misc: crate::constants::PERF_RECORD_MISC_USER,
            data: EventData::Mmap2(Mmap2Record {
                pid: 1001,
                tid: 1002,
                addr: 0x1c1000,
                len: 0x1000,
                pgoff: 0x2000,
                file_id: Mmap2FileId::InodeAndVersion {
                    maj: 8,
                    min: 1,
                    ino: 123456,
                    ino_generation: 1,
                },
                prot: 5,
                flags: 2,
                filename: b"/usr/lib/foo.so".to_vec(),
            }),
            sample_info: None,
            attr_index: 0,
        };
        assert_eq!(round_trip(&event, &plain_attr()), event);
    }

    #[test]
    fn mmap2_build_id_round_trip() {
        let event = Event {
            misc: crate::constants::PERF_RECORD_MISC_USER
                | crate::constants::PERF_RECORD_MISC_MMAP_BUILD_ID,
            data: EventData::Mmap2(Mmap2Record {
                pid: 1,
                tid: 1,
                addr: 0x400000,
                len: 0x1000,
                pgoff: 0,
                file_id: Mmap2FileId::BuildId(vec![0xab; 20]),
                prot: 5,
                flags: 2,
                filename: b"/bin/true".to_vec(),
            }),
            sample_info: None,
            attr_index: 0,
        };
        assert_eq!(round_trip(&event, &plain_attr()), event);
    }

    #[test]
    fn switch_cpu_wide_round_trip_preserves_direction() {
        let event = Event {
            misc: crate::constants::PERF_RECORD_MISC_SWITCH_OUT,
            data: EventData::SwitchCpuWide(SwitchCpuWideRecord {
                next_prev_pid: 5656,
                next_prev_tid: 5656,
            }),
            sample_info: None,
            attr_index: 0,
        };
        let back = round_trip(&event, &plain_attr());
        assert_eq!(back, event);
        assert_ne!(back.misc & crate::constants::PERF_RECORD_MISC_SWITCH_OUT, 0);
    }

    #[test]
    fn time_conv_short_and_long_forms() {
        let attr = plain_attr();
        let short = Event {
            misc: 0,
            data: EventData::TimeConv(TimeConvRecord {
                time_shift: 10,
                time_mult: 3,
                time_zero: 1000,
                extended: None,
            }),
            sample_info: None,
            attr_index: 0,
        };
        let mut w = ByteWriter::new(Endianness::LittleEndian);
        let size = short.write(&mut w, &attr);
        assert_eq!(size, TimeConvRecord::SHORT_SIZE);
        assert_eq!(round_trip(&short, &attr), short);

        let long = Event {
            misc: 0,
            data: EventData::TimeConv(TimeConvRecord {
                time_shift: 10,
                time_mult: 3,
                time_zero: 1000,
                extended: Some(TimeConvExtension {
                    time_cycles: 5,
                    time_mask: 0xffff,
                    cap_user_time_zero: true,
                    cap_user_time_short: false,
                }),
            }),
            sample_info: None,
            attr_index: 0,
        };
        let mut w = ByteWriter::new(Endianness::LittleEndian);
        let size = long.write(&mut w, &attr);
        assert_eq!(size, TimeConvRecord::FULL_SIZE);
        assert_eq!(round_trip(&long, &attr), long);
    }

    #[test]
    fn comm_with_trailer_round_trip() {
        let mut attr = plain_attr();
        attr.sample_format = SampleFormat::TID | SampleFormat::TIME | SampleFormat::ID;
        attr.flags = AttrFlags::SAMPLE_ID_ALL;
        let event = Event {
            misc: 0,
            data: EventData::Comm(CommRecord {
                pid: 42,
                tid: 42,
                comm: b"dump_syms".to_vec(),
            }),
            sample_info: Some(crate::sample_info::SampleInfo {
                pid: Some(42),
                tid: Some(42),
                time: Some(777),
                id: Some(3),
                stream_id: None,
                cpu: None,
            }),
            attr_index: 0,
        };

        let mut w = ByteWriter::new(Endianness::LittleEndian);
        event.write(&mut w, &attr);
        let buf = w.into_vec();
        let mut header = ByteReader::new(&buf, Endianness::LittleEndian);
        let type_ = header.read_u32().unwrap();
        let _misc = header.read_u16().unwrap();
        let size = header.read_u16().unwrap() as usize;
        assert_eq!(size, buf.len());

        let codec = SampleInfoCodec::new(&attr);
        let body = &buf[8..size];
        let mut reader = ByteReader::new(body, Endianness::LittleEndian);
        let data = EventData::parse(
            RecordType(type_),
            0,
            &mut reader,
            &attr,
            codec.trailer_size(),
        )
        .unwrap();
        let info = codec.parse(&mut reader).unwrap();
        assert_eq!(data, event.data);
        assert_eq!(Some(info), event.sample_info);
    }

    #[test]
    fn size_mismatch_detected() {
        // A LOST record whose header.size claims more payload than LOST has.
        let mut w = ByteWriter::new(Endianness::LittleEndian);
        w.write_u64(1);
        w.write_u64(2);
        w.write_u64(3); // excess word
        let body = w.into_vec();
        let mut reader = ByteReader::new(&body, Endianness::LittleEndian);
        let err = EventData::parse(RecordType::LOST, 0, &mut reader, &plain_attr(), 0);
        assert!(matches!(err, Err(Error::SizeMismatch { .. })));
    }
}
