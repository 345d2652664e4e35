use std::io;

/// The error type used in this crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The input ended inside a region that the container declared.
    #[error("Input truncated while reading {0}")]
    Truncated(&'static str),

    /// A length or offset contradicts the container invariants.
    #[error("Malformed container: {0}")]
    Malformed(&'static str),

    /// An event's header.size disagrees with its computed payload size.
    #[error("Event size mismatch for record type {record_type}: header says {header_size}, computed {computed_size}")]
    SizeMismatch {
        record_type: u32,
        header_size: usize,
        computed_size: usize,
    },

    /// A record carries an event ID that no attribute declared.
    #[error("Record carries unknown event ID {0}")]
    UnknownEventId(u64),

    /// The attributes disagree on where the event ID lives inside records,
    /// so records cannot be routed to their attribute.
    #[error("Attribute {0} places the sample ID at a different position than attribute 0")]
    InconsistentSampleIdPosition(usize),

    /// There is more than one attribute but no way to tell which one a
    /// record belongs to.
    #[error("Multiple attributes but attribute {0} does not include an ID in its samples")]
    MissingIdWithMultipleAttrs(usize),

    /// The fraction of resolved samples fell below the configured threshold.
    #[error("Only {mapped} of {total} samples resolved to a mapping, below the required fraction {threshold}")]
    InsufficientlyMapped {
        mapped: u64,
        total: u64,
        threshold: f64,
    },

    /// The caller's cancellation token tripped between events.
    #[error("Parse cancelled")]
    Cancelled,

    #[error("Did not recognize magic value {0:?}")]
    UnrecognizedMagicValue([u8; 8]),

    #[error("Section size did not fit into usize")]
    SectionSizeTooBig,

    #[error("The section wasn't big enough to contain the u32 string length")]
    NotEnoughSpaceForStringLen,

    #[error("The section wasn't big enough to contain the u32 string list length")]
    NotEnoughSpaceForStringListLen,

    #[error("The section wasn't big enough to contain the NrCpus struct")]
    NotEnoughSpaceForNrCpus,

    #[error("The indicated string length wouldn't fit in the indicated section size")]
    StringLengthTooLong,

    #[error("The indicated string list length wouldn't fit into usize")]
    StringListLengthBiggerThanUsize,

    #[error("The indicated string length wouldn't fit into usize")]
    StringLengthBiggerThanUsize,

    #[error("The string was not valid utf-8")]
    StringUtf8,

    #[error("The specified size in the perf event header was smaller than the header itself")]
    InvalidPerfEventSize,

    #[error("The file contains no event attributes")]
    NoAttributes,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
