//! Translation of the parsed model into the structured message form.

use crate::attr::EventAttr;
use crate::buffer::ByteWriter;
use crate::buildid::bytes_to_hex;
use crate::constants::{PERF_RECORD_MISC_COMM_EXEC, PERF_RECORD_MISC_SWITCH_OUT};
use crate::event_record::{Event, EventData, Mmap2FileId};
use crate::file_reader::PerfData;
use crate::parser::{DsoAndOffset, ParsedEvent, Stats};
use crate::proto::*;
use crate::sample::{SampleRecord, Weight};
use crate::types::AttrFlags;

fn lossy_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn dso_proto(resolution: &DsoAndOffset) -> DsoAndOffsetProto {
    DsoAndOffsetProto {
        dso_name: Some(lossy_string(&resolution.dso_name)),
        offset: Some(resolution.offset),
        build_id: resolution.build_id.clone(),
    }
}

/// Produce the structured message for a parsed profile.
///
/// `parsed` is the parser's output sequence (indices into `data.events`
/// plus address resolutions); `stats` is its counter aggregate.
pub fn serialize_profile(data: &PerfData, parsed: &[ParsedEvent], stats: &Stats) -> PerfDataProto {
    let file_attrs = data.attrs.iter().map(|desc| attr_proto(desc)).collect();

    let events = parsed
        .iter()
        .filter_map(|parsed_event| {
            let event = data.events.get(parsed_event.event_index)?;
            Some(event_proto(data, event, parsed_event))
        })
        .collect();

    let build_ids = data
        .build_ids
        .to_records()
        .into_iter()
        .map(|record| BuildIdProto {
            misc: record.misc as u32,
            pid: record.pid,
            filename: lossy_string(&record.filename),
            build_id_hash: crate::buildid::perfize_build_id(&bytes_to_hex(&record.build_id)),
            is_injected: data.build_ids.is_injected(&record.filename),
        })
        .collect();

    PerfDataProto {
        file_attrs,
        events,
        build_ids,
        stats: Some(StatsProto {
            num_mmap_events: stats.num_mmap_events,
            num_sample_events: stats.num_sample_events,
            num_sample_events_mapped: stats.num_sample_events_mapped,
            num_data_sample_events: stats.num_data_sample_events,
            num_data_sample_events_mapped: stats.num_data_sample_events_mapped,
            did_remap: stats.did_remap,
        }),
        string_metadata: Some(string_metadata(data)),
    }
}

fn attr_proto(desc: &crate::feature_sections::AttributeDescription) -> EventAttrProto {
    let attr = &desc.attr;
    EventAttrProto {
        r#type: attr.type_,
        config: attr.config,
        sample_type: attr.sample_format.bits(),
        read_format: attr.read_format.bits(),
        sample_period_or_freq: attr.sample_period_or_freq,
        freq: attr.flags.contains(AttrFlags::FREQ),
        sample_id_all: attr.sample_id_all(),
        exclude_kernel: attr.flags.contains(AttrFlags::EXCLUDE_KERNEL),
        precise_ip: attr.precise_ip() as u32,
        branch_sample_type: attr.branch_sample_format.bits(),
        name: desc.name.clone(),
        ids: desc.event_ids.clone(),
    }
}

fn string_metadata(data: &PerfData) -> StringMetadataProto {
    let nr_cpus = data.nr_cpus().unwrap_or(None);
    StringMetadataProto {
        hostname: data.hostname().unwrap_or(None),
        os_release: data.os_release().unwrap_or(None),
        perf_version: data.perf_version().unwrap_or(None),
        architecture: data.arch().unwrap_or(None),
        cpu_description: data.cpu_desc().unwrap_or(None),
        cpu_id: data.cpu_id().unwrap_or(None),
        perf_command_line_token: data.cmdline().unwrap_or(None).unwrap_or_default(),
        total_mem_kb: data.total_mem().unwrap_or(None),
        nr_cpus_available: nr_cpus.map(|n| n.nr_cpus_available),
        nr_cpus_online: nr_cpus.map(|n| n.nr_cpus_online),
    }
}

fn event_proto(data: &PerfData, event: &Event, parsed: &ParsedEvent) -> PerfEventProto {
    let attr = data
        .attrs
        .get(event.attr_index)
        .map(|desc| desc.attr)
        .unwrap_or_else(zeroed_attr);

    // The header size is recomputed from the serialized form; address
    // rewriting and filename localization may have changed it.
    let mut scratch = ByteWriter::new(data.endian());
    let size = event.write(&mut scratch, &attr);

    PerfEventProto {
        header: Some(EventHeaderProto {
            r#type: event.record_type().0,
            misc: event.misc as u32,
            size: size as u32,
        }),
        timestamp_ns: event.timestamp(),
        event: typed_event_proto(event, parsed),
    }
}

fn typed_event_proto(event: &Event, parsed: &ParsedEvent) -> Option<PerfEventTypedProto> {
    let misc = event.misc;
    let typed = match &event.data {
        EventData::Mmap(mmap) => PerfEventTypedProto::MmapEvent(MmapEventProto {
            pid: mmap.pid,
            tid: mmap.tid,
            start: mmap.addr,
            len: mmap.len,
            pgoff: mmap.pgoff,
            filename: lossy_string(&mmap.filename),
            maj: None,
            min: None,
            ino: None,
            ino_generation: None,
            prot: None,
            flags: None,
            build_id: None,
        }),
        EventData::Mmap2(mmap) => {
            let (maj, min, ino, ino_generation, build_id) = match &mmap.file_id {
                Mmap2FileId::InodeAndVersion {
                    maj,
                    min,
                    ino,
                    ino_generation,
                } => (Some(*maj), Some(*min), Some(*ino), Some(*ino_generation), None),
                Mmap2FileId::BuildId(build_id) => {
                    (None, None, None, None, Some(bytes_to_hex(build_id)))
                }
            };
            PerfEventTypedProto::MmapEvent(MmapEventProto {
                pid: mmap.pid,
                tid: mmap.tid,
                start: mmap.addr,
                len: mmap.len,
                pgoff: mmap.pgoff,
                filename: lossy_string(&mmap.filename),
                maj,
                min,
                ino,
                ino_generation,
                prot: Some(mmap.prot),
                flags: Some(mmap.flags),
                build_id,
            })
        }
        EventData::Comm(comm) => PerfEventTypedProto::CommEvent(CommEventProto {
            pid: comm.pid,
            tid: comm.tid,
            comm: lossy_string(&comm.comm),
            is_exec: misc & PERF_RECORD_MISC_COMM_EXEC != 0,
        }),
        EventData::Fork(fork) => PerfEventTypedProto::ForkEvent(fork_proto(fork)),
        EventData::Exit(exit) => PerfEventTypedProto::ExitEvent(fork_proto(exit)),
        EventData::Lost(lost) => PerfEventTypedProto::LostEvent(LostEventProto {
            id: lost.id,
            lost: lost.lost,
        }),
        EventData::LostSamples(lost) => {
            PerfEventTypedProto::LostSamplesEvent(LostSamplesEventProto { lost: lost.lost })
        }
        EventData::Throttle(throttle) | EventData::Unthrottle(throttle) => {
            PerfEventTypedProto::ThrottleEvent(ThrottleEventProto {
                time_ns: throttle.time,
                id: throttle.id,
                stream_id: throttle.stream_id,
            })
        }
        EventData::Sample(sample) => {
            PerfEventTypedProto::SampleEvent(sample_proto(sample, parsed))
        }
        EventData::Aux(aux) => PerfEventTypedProto::AuxEvent(AuxEventProto {
            aux_offset: aux.aux_offset,
            aux_size: aux.aux_size,
            flags: aux.flags,
        }),
        EventData::ItraceStart(itrace) => {
            PerfEventTypedProto::ItraceStartEvent(ItraceStartEventProto {
                pid: itrace.pid,
                tid: itrace.tid,
            })
        }
        EventData::Switch => PerfEventTypedProto::ContextSwitchEvent(ContextSwitchEventProto {
            is_out: misc & PERF_RECORD_MISC_SWITCH_OUT != 0,
            next_prev_pid: None,
            next_prev_tid: None,
        }),
        EventData::SwitchCpuWide(switch) => {
            PerfEventTypedProto::ContextSwitchEvent(ContextSwitchEventProto {
                is_out: misc & PERF_RECORD_MISC_SWITCH_OUT != 0,
                next_prev_pid: Some(switch.next_prev_pid),
                next_prev_tid: Some(switch.next_prev_tid),
            })
        }
        EventData::Namespaces(namespaces) => {
            PerfEventTypedProto::NamespacesEvent(NamespacesEventProto {
                pid: namespaces.pid,
                tid: namespaces.tid,
                dev: namespaces.namespaces.iter().map(|entry| entry.dev).collect(),
                ino: namespaces.namespaces.iter().map(|entry| entry.ino).collect(),
            })
        }
        EventData::Cgroup(cgroup) => PerfEventTypedProto::CgroupEvent(CgroupEventProto {
            id: cgroup.id,
            path: lossy_string(&cgroup.path),
        }),
        EventData::Auxtrace(auxtrace) => PerfEventTypedProto::AuxtraceEvent(AuxtraceEventProto {
            size: auxtrace.size,
            offset: auxtrace.offset,
            reference: auxtrace.reference,
            idx: auxtrace.idx,
            tid: auxtrace.tid,
            cpu: auxtrace.cpu,
            trace_data: auxtrace.trace_data.clone(),
        }),
        EventData::AuxtraceError(error) => {
            PerfEventTypedProto::AuxtraceErrorEvent(AuxtraceErrorEventProto {
                r#type: error.type_,
                code: error.code,
                cpu: error.cpu,
                pid: error.pid,
                tid: error.tid,
                ip: error.ip,
                msg: lossy_string(&error.msg),
            })
        }
        EventData::AuxtraceInfo(info) => {
            PerfEventTypedProto::AuxtraceInfoEvent(AuxtraceInfoEventProto {
                r#type: info.type_,
                unparsed_binary_blob_priv_data: info.priv_.clone(),
            })
        }
        EventData::ThreadMap(map) => PerfEventTypedProto::ThreadMapEvent(ThreadMapEventProto {
            entries: map
                .entries
                .iter()
                .map(|entry| ThreadMapEntryProto {
                    pid: entry.pid,
                    comm: lossy_string(&entry.comm),
                })
                .collect(),
        }),
        EventData::StatConfig(config) => {
            PerfEventTypedProto::StatConfigEvent(StatConfigEventProto {
                tag: config.entries.iter().map(|entry| entry.tag).collect(),
                val: config.entries.iter().map(|entry| entry.val).collect(),
            })
        }
        EventData::Stat(stat) => PerfEventTypedProto::StatEvent(StatEventProto {
            id: stat.id,
            cpu: stat.cpu,
            thread: stat.thread,
            value: stat.val,
            enabled: stat.ena,
            running: stat.run,
        }),
        EventData::StatRound(round) => PerfEventTypedProto::StatRoundEvent(StatRoundEventProto {
            r#type: round.type_,
            time_ns: round.time,
        }),
        EventData::TimeConv(conv) => PerfEventTypedProto::TimeConvEvent(TimeConvEventProto {
            time_shift: conv.time_shift,
            time_mult: conv.time_mult,
            time_zero: conv.time_zero,
            time_cycles: conv.extended.map(|ext| ext.time_cycles),
            time_mask: conv.extended.map(|ext| ext.time_mask),
            cap_user_time_zero: conv.extended.map(|ext| ext.cap_user_time_zero),
            cap_user_time_short: conv.extended.map(|ext| ext.cap_user_time_short),
        }),
        EventData::FinishedRound => return None,
    };
    Some(typed)
}

fn fork_proto(record: &crate::event_record::ForkOrExitRecord) -> ForkOrExitEventProto {
    ForkOrExitEventProto {
        pid: record.pid,
        ppid: record.ppid,
        tid: record.tid,
        ptid: record.ptid,
        time_ns: record.time,
    }
}

fn sample_proto(sample: &SampleRecord, parsed: &ParsedEvent) -> SampleEventProto {
    let branch_stack = sample
        .branch_stack
        .as_ref()
        .map(|stack| {
            stack
                .entries
                .iter()
                .enumerate()
                .map(|(i, entry)| BranchStackEntryProto {
                    from_ip: entry.from,
                    to_ip: entry.to,
                    mispredicted: entry.mispred(),
                    predicted: entry.predicted(),
                    in_transaction: entry.in_tx(),
                    abort: entry.abort(),
                    cycles: entry.cycles() as u32,
                    from_mapping: parsed
                        .branch_stack
                        .get(i)
                        .and_then(|res| res.from.as_ref())
                        .map(dso_proto),
                    to_mapping: parsed
                        .branch_stack
                        .get(i)
                        .and_then(|res| res.to.as_ref())
                        .map(dso_proto),
                })
                .collect()
        })
        .unwrap_or_default();

    SampleEventProto {
        ip: sample.ip,
        pid: sample.pid,
        tid: sample.tid,
        sample_time_ns: sample.time,
        addr: sample.addr,
        id: sample.id,
        stream_id: sample.stream_id,
        cpu: sample.cpu,
        period: sample.period,
        callchain: sample.callchain.clone().unwrap_or_default(),
        raw: sample.raw.clone(),
        branch_stack,
        weight: match sample.weight {
            Some(Weight::Full(weight)) => Some(weight),
            Some(Weight::Struct { var1_dw, .. }) => Some(var1_dw as u64),
            None => None,
        },
        data_src: sample.data_src,
        transaction: sample.transaction,
        phys_addr: sample.phys_addr,
        cgroup: sample.cgroup,
        data_page_size: sample.data_page_size,
        code_page_size: sample.code_page_size,
        dso_and_offset: parsed.dso_and_offset.as_ref().map(dso_proto),
        data_dso_and_offset: parsed.data_dso_and_offset.as_ref().map(dso_proto),
    }
}

fn zeroed_attr() -> EventAttr {
    EventAttr {
        type_: 0,
        size: EventAttr::CURRENT_SIZE,
        config: 0,
        sample_period_or_freq: 0,
        sample_format: crate::types::SampleFormat::empty(),
        read_format: crate::types::ReadFormat::empty(),
        flags: AttrFlags::empty(),
        wakeup_events_or_watermark: 0,
        bp_type: crate::types::HwBreakpointType::empty(),
        bp_addr_or_config1: 0,
        bp_len_or_config2: 0,
        branch_sample_format: crate::types::BranchSampleFormat::empty(),
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
