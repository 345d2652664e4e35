/// The byte order of a perf.data file.
///
/// The file's magic value tells us which order the producing machine used;
/// when it differs from the host order, every multi-byte field has to be
/// swapped on the way in and on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    LittleEndian,
    BigEndian,
}

impl Endianness {
    /// The native endianness of this machine.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Self = Self::LittleEndian;
    /// The native endianness of this machine.
    #[cfg(target_endian = "big")]
    pub const NATIVE: Self = Self::BigEndian;

    /// Whether data of this endianness needs swapping on this machine.
    pub fn is_cross(self) -> bool {
        self != Self::NATIVE
    }
}
