use crate::buffer::{ByteReader, ByteWriter};
use crate::constants::*;
use crate::error::Error;
use crate::types::{AttrFlags, BranchSampleFormat, HwBreakpointType, ReadFormat, SampleFormat};

/// `perf_event_attr`: what one counter samples and how its sample payloads
/// are laid out.
///
/// The struct has grown over kernel releases; the embedded `size` field says
/// which revision wrote it. Older records are upgraded on read by leaving
/// the newer fields zero and normalizing `size` to the current layout, so
/// the in-memory form is always the newest revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventAttr {
    /// Major type: hardware/software/tracepoint/etc.
    pub type_: u32,
    /// The size the producer declared for this struct.
    pub size: u32,
    /// Type-specific configuration information.
    pub config: u64,
    /// Sampling period, or frequency if `AttrFlags::FREQ` is set.
    pub sample_period_or_freq: u64,
    /// Which fields sample payloads and sample-info trailers carry.
    pub sample_format: SampleFormat,
    /// The shape of counter read values.
    pub read_format: ReadFormat,
    /// The flag bitfield, including the two precise-IP bits.
    pub flags: AttrFlags,
    /// Wakeup every n events, or watermark bytes if `AttrFlags::WATERMARK`.
    pub wakeup_events_or_watermark: u32,
    pub bp_type: HwBreakpointType,
    /// `bp_addr` / `kprobe_func` / `uprobe_path` / `config1`.
    pub bp_addr_or_config1: u64,
    /// `bp_len` / `kprobe_addr` / `probe_offset` / `config2`.
    pub bp_len_or_config2: u64,
    pub branch_sample_format: BranchSampleFormat,
    /// Set of user regs to dump on samples.
    pub sample_regs_user: u64,
    /// Size of the user stack to dump on samples.
    pub sample_stack_user: u32,
    pub clockid: u32,
    /// Set of regs to dump on each sampled instruction.
    pub sample_regs_intr: u64,
    /// Wakeup watermark for the AUX area.
    pub aux_watermark: u32,
    /// Maximum number of stack frames to collect.
    pub sample_max_stack: u16,
    /// Size of AUX samples.
    pub aux_sample_size: u32,
    /// User data passed back via SIGTRAP siginfo.
    pub sig_data: u64,
}

impl EventAttr {
    /// The current (newest known) layout size.
    pub const CURRENT_SIZE: u32 = PERF_ATTR_SIZE_VER7;

    /// Whether every record of this attribute carries a sample-info trailer.
    pub fn sample_id_all(&self) -> bool {
        self.flags.contains(AttrFlags::SAMPLE_ID_ALL)
    }

    /// The two-bit instruction-address precision level.
    pub fn precise_ip(&self) -> u8 {
        ((self.flags.bits() & ATTR_FLAG_BITMASK_PRECISE_IP) >> 15) as u8
    }

    /// Parse one attribute record from `reader`.
    ///
    /// `size_override` forces the size when the container states it out of
    /// band (the attribute table stride, or EVENT_DESC's attr_size); without
    /// it the struct's own size field wins. The cursor ends up exactly
    /// `max(size, VER0)` bytes past where it started.
    pub fn parse(reader: &mut ByteReader, size_override: Option<u32>) -> Result<Self, Error> {
        let type_ = reader.read_u32()?;
        let self_described_size = reader.read_u32()?;
        let size = size_override.unwrap_or(self_described_size);
        if size < PERF_ATTR_SIZE_VER0 {
            return Err(Error::Malformed("perf_event_attr size below VER0"));
        }

        let config = reader.read_u64()?;
        let sample_period_or_freq = reader.read_u64()?;
        let sample_type = reader.read_u64()?;
        let read_format = reader.read_u64()?;
        let flags = read_attr_bitfield(reader)?;
        let wakeup_events_or_watermark = reader.read_u32()?;
        let bp_type = reader.read_u32()?;
        let bp_addr_or_config1 = reader.read_u64()?;

        let bp_len_or_config2 = if size >= PERF_ATTR_SIZE_VER1 {
            reader.read_u64()?
        } else {
            0
        };
        let branch_sample_type = if size >= PERF_ATTR_SIZE_VER2 {
            reader.read_u64()?
        } else {
            0
        };
        let (sample_regs_user, sample_stack_user, clockid) = if size >= PERF_ATTR_SIZE_VER3 {
            let regs = reader.read_u64()?;
            let stack = reader.read_u32()?;
            let clockid = reader.read_u32()?;
            (regs, stack, clockid)
        } else {
            (0, 0, 0)
        };
        let sample_regs_intr = if size >= PERF_ATTR_SIZE_VER4 {
            reader.read_u64()?
        } else {
            0
        };
        let (aux_watermark, sample_max_stack) = if size >= PERF_ATTR_SIZE_VER5 {
            let aux_watermark = reader.read_u32()?;
            let sample_max_stack = reader.read_u16()?;
            let _reserved = reader.read_u16()?;
            (aux_watermark, sample_max_stack)
        } else {
            (0, 0)
        };
        let aux_sample_size = if size >= PERF_ATTR_SIZE_VER6 {
            let aux_sample_size = reader.read_u32()?;
            let _reserved = reader.read_u32()?;
            aux_sample_size
        } else {
            0
        };
        let sig_data = if size >= PERF_ATTR_SIZE_VER7 {
            reader.read_u64()?
        } else {
            0
        };

        // Skip anything a newer producer appended past VER7.
        if size > PERF_ATTR_SIZE_VER7 {
            reader.skip((size - PERF_ATTR_SIZE_VER7) as usize)?;
        }

        Ok(Self {
            type_,
            size: Self::CURRENT_SIZE,
            config,
            sample_period_or_freq,
            sample_format: SampleFormat::from_bits_retain(sample_type),
            read_format: ReadFormat::from_bits_retain(read_format),
            flags: AttrFlags::from_bits_retain(flags),
            wakeup_events_or_watermark,
            bp_type: HwBreakpointType::from_bits_retain(bp_type),
            bp_addr_or_config1,
            bp_len_or_config2,
            branch_sample_format: BranchSampleFormat::from_bits_retain(branch_sample_type),
            sample_regs_user,
            sample_stack_user,
            clockid,
            sample_regs_intr,
            aux_watermark,
            sample_max_stack,
            aux_sample_size,
            sig_data,
        })
    }

    /// Write this attribute, staged exactly as far as its `size` says.
    pub fn write(&self, writer: &mut ByteWriter) {
        let size = self.size.max(PERF_ATTR_SIZE_VER0);
        writer.write_u32(self.type_);
        writer.write_u32(self.size);
        writer.write_u64(self.config);
        writer.write_u64(self.sample_period_or_freq);
        writer.write_u64(self.sample_format.bits());
        writer.write_u64(self.read_format.bits());
        write_attr_bitfield(writer, self.flags.bits());
        writer.write_u32(self.wakeup_events_or_watermark);
        writer.write_u32(self.bp_type.bits());
        writer.write_u64(self.bp_addr_or_config1);
        if size >= PERF_ATTR_SIZE_VER1 {
            writer.write_u64(self.bp_len_or_config2);
        }
        if size >= PERF_ATTR_SIZE_VER2 {
            writer.write_u64(self.branch_sample_format.bits());
        }
        if size >= PERF_ATTR_SIZE_VER3 {
            writer.write_u64(self.sample_regs_user);
            writer.write_u32(self.sample_stack_user);
            writer.write_u32(self.clockid);
        }
        if size >= PERF_ATTR_SIZE_VER4 {
            writer.write_u64(self.sample_regs_intr);
        }
        if size >= PERF_ATTR_SIZE_VER5 {
            writer.write_u32(self.aux_watermark);
            writer.write_u16(self.sample_max_stack);
            writer.write_u16(0);
        }
        if size >= PERF_ATTR_SIZE_VER6 {
            writer.write_u32(self.aux_sample_size);
            writer.write_u32(0);
        }
        if size >= PERF_ATTR_SIZE_VER7 {
            writer.write_u64(self.sig_data);
        }
        if size > PERF_ATTR_SIZE_VER7 {
            writer.write_zeros((size - PERF_ATTR_SIZE_VER7) as usize);
        }
    }
}

/// Read the attr flag bitfield.
///
/// C bitfield layout is not endian-neutral: the producing compiler allocated
/// flag bits from the opposite end of the word on a foreign-endian machine.
/// The ABI-correct fixup is a byte swap of the opaque word followed by a bit
/// reversal within each byte (together: a full 64-bit bit reversal). That
/// reversal also flips the two-bit precise-IP field end-for-end, so its pair
/// of bits has to be swapped back afterwards.
fn read_attr_bitfield(reader: &mut ByteReader) -> Result<u64, Error> {
    let v = reader.read_u64()?;
    if !reader.endian().is_cross() {
        return Ok(v);
    }
    Ok(fix_precise_ip(v.reverse_bits()))
}

fn write_attr_bitfield(writer: &mut ByteWriter, v: u64) {
    if writer.endian().is_cross() {
        writer.write_u64(fix_precise_ip(v).reverse_bits());
    } else {
        writer.write_u64(v);
    }
}

fn fix_precise_ip(v: u64) -> u64 {
    let precise = (v & ATTR_FLAG_BITMASK_PRECISE_IP) >> 15;
    let swapped = (precise & 0b10) >> 1 | (precise & 0b01) << 1;
    (v & !ATTR_FLAG_BITMASK_PRECISE_IP) | swapped << 15
}
