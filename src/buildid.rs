use linear_map::LinearMap;

use crate::build_id_event::BuildIdRecord;
use crate::constants::PERF_RECORD_MISC_KERNEL;

/// The length of a perfized build ID string: 20 bytes as lowercase hex.
pub const BUILD_ID_STRING_LEN: usize = 40;

/// Pad a hex build ID string with trailing zeros to the full 40 characters.
/// All comparisons in this crate use the perfized form.
pub fn perfize_build_id(build_id: &str) -> String {
    let mut s = build_id.to_ascii_lowercase();
    while s.len() < BUILD_ID_STRING_LEN {
        s.push('0');
    }
    s.truncate(BUILD_ID_STRING_LEN);
    s
}

/// Strip trailing zeros from a hex build ID string, in groups of eight hex
/// characters (four bytes), until fewer than eight trailing zeros remain or
/// the string empties.
pub fn trim_zeroes_build_id(build_id: &str) -> String {
    let mut s = build_id.to_string();
    const CHUNK: usize = 8;
    while s.len() >= CHUNK && s[s.len() - CHUNK..].bytes().all(|b| b == b'0') {
        s.truncate(s.len() - CHUNK);
    }
    s
}

pub fn bytes_to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

pub fn hex_to_bytes(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredBuildId {
    /// Perfized (40 hex chars).
    hex: String,
    injected: bool,
    /// Header bits carried over from the wire entry (or chosen at
    /// injection time); needed to write the entry back.
    misc: u16,
    pid: i32,
}

/// The filename → build ID store backing the BUILD_ID feature section.
///
/// Entries observed in the file are recorded with first-write-wins
/// semantics; injected entries override observed ones. Insertion order is
/// preserved so that writing the section back reproduces the input order.
#[derive(Debug, Clone, Default)]
pub struct BuildIdStore {
    entries: LinearMap<Vec<u8>, StoredBuildId>,
}

impl BuildIdStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Record a wire entry. The first observation for a filename wins.
    pub fn observe_record(&mut self, record: &BuildIdRecord) {
        if self.entries.contains_key(&record.filename) {
            return;
        }
        self.entries.insert(
            record.filename.clone(),
            StoredBuildId {
                hex: perfize_build_id(&bytes_to_hex(&record.build_id)),
                injected: false,
                misc: record.misc,
                pid: record.pid,
            },
        );
    }

    /// Insert or replace a build ID from the outside. `misc` is only used
    /// for entries that do not exist yet (existing entries keep their
    /// header bits from the wire).
    pub fn inject(&mut self, filename: &[u8], build_id_hex: &str, misc: Option<u16>) {
        let hex = perfize_build_id(build_id_hex);
        if let Some(entry) = self.entries.get_mut(filename) {
            entry.hex = hex;
            entry.injected = true;
            return;
        }
        self.entries.insert(
            filename.to_vec(),
            StoredBuildId {
                hex,
                injected: true,
                misc: misc.unwrap_or(PERF_RECORD_MISC_KERNEL),
                pid: crate::build_id_event::DEFAULT_BUILD_ID_PID,
            },
        );
    }

    /// The perfized build ID for a filename.
    pub fn get(&self, filename: &[u8]) -> Option<&str> {
        self.entries.get(filename).map(|entry| entry.hex.as_str())
    }

    pub fn contains(&self, filename: &[u8]) -> bool {
        self.entries.contains_key(filename)
    }

    pub fn is_injected(&self, filename: &[u8]) -> bool {
        self.entries
            .get(filename)
            .is_some_and(|entry| entry.injected)
    }

    /// The reverse direction: the filename recorded for a build ID. The
    /// query is perfized before comparison.
    pub fn filename_for_build_id(&self, build_id_hex: &str) -> Option<&[u8]> {
        let wanted = perfize_build_id(build_id_hex);
        self.entries
            .iter()
            .find(|(_, stored)| stored.hex == wanted)
            .map(|(filename, _)| filename.as_slice())
    }

    pub fn filenames(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.keys().map(|filename| filename.as_slice())
    }

    /// Re-key an entry under a new filename (localization). A no-op when
    /// nothing is stored under the old name.
    pub fn rename(&mut self, old_filename: &[u8], new_filename: &[u8]) {
        if old_filename == new_filename {
            return;
        }
        if let Some(entry) = self.entries.remove(old_filename) {
            self.entries.insert(new_filename.to_vec(), entry);
        }
    }

    /// Duplicate each entry under every alternate filename.
    pub fn add_alternate_filenames(&mut self, alternates: &[(Vec<u8>, Vec<u8>)]) {
        let mut new_entries = Vec::new();
        for (old, new) in alternates {
            if let Some(entry) = self.entries.get(old) {
                new_entries.push((new.clone(), entry.clone()));
            }
        }
        for (filename, entry) in new_entries {
            self.entries.insert(filename, entry);
        }
    }

    /// Turn the store back into wire entries, in insertion order.
    pub fn to_records(&self) -> Vec<BuildIdRecord> {
        self.entries
            .iter()
            .map(|(filename, stored)| BuildIdRecord {
                misc: stored.misc,
                pid: stored.pid,
                build_id: hex_to_bytes(&stored.hex).unwrap_or_default(),
                filename: filename.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn perfize_pads_to_forty() {
        assert_eq!(
            perfize_build_id("f"),
            "f000000000000000000000000000000000000000"
        );
        let full = "0123456789012345678901234567890123456789";
        assert_eq!(perfize_build_id(full), full);
    }

    #[test]
    fn perfize_is_idempotent() {
        let once = perfize_build_id("abc123");
        assert_eq!(perfize_build_id(&once), once);
    }

    #[test]
    fn trim_strips_zero_chunks() {
        assert_eq!(
            trim_zeroes_build_id("f000000000000000000000000000000000000000"),
            "f0000000"
        );
        assert_eq!(trim_zeroes_build_id("00000000"), "");
        assert_eq!(trim_zeroes_build_id("0000000"), "0000000");
    }

    #[test]
    fn trim_is_idempotent() {
        for s in [
            "f000000000000000000000000000000000000000",
            "00000000",
            "0000000",
            "deadbeef",
        ] {
            let once = trim_zeroes_build_id(s);
            assert_eq!(trim_zeroes_build_id(&once), once);
        }
    }

    fn record(filename: &[u8], build_id: &[u8]) -> BuildIdRecord {
        BuildIdRecord::new(build_id.to_vec(), filename.to_vec(), Some(2))
    }

    #[test]
    fn observe_first_write_wins() {
        let mut store = BuildIdStore::new();
        store.observe_record(&record(b"/bin/a", &[0xaa; 4]));
        store.observe_record(&record(b"/bin/a", &[0xbb; 4]));
        assert_eq!(
            store.get(b"/bin/a"),
            Some("aaaaaaaa00000000000000000000000000000000")
        );
    }

    #[test]
    fn inject_overrides_observed() {
        let mut store = BuildIdStore::new();
        store.observe_record(&record(b"/bin/a", &[0xaa; 4]));
        store.inject(b"/bin/a", "bbbbbbbb", None);
        assert_eq!(
            store.get(b"/bin/a"),
            Some("bbbbbbbb00000000000000000000000000000000")
        );
        assert!(store.is_injected(b"/bin/a"));
        // The wire entry keeps the misc of the observed record.
        assert_eq!(store.to_records()[0].misc, 2);
    }

    #[test]
    fn reverse_lookup_perfizes_the_query() {
        let mut store = BuildIdStore::new();
        store.observe_record(&record(b"/bin/a", &[0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(
            store.filename_for_build_id("deadbeef"),
            Some(&b"/bin/a"[..])
        );
    }

    #[test]
    fn alternates_duplicate_entries() {
        let mut store = BuildIdStore::new();
        store.observe_record(&record(b"/bin/a", &[1, 2, 3, 4]));
        store.add_alternate_filenames(&[(b"/bin/a".to_vec(), b"/chroot/bin/a".to_vec())]);
        assert_eq!(store.get(b"/bin/a"), store.get(b"/chroot/bin/a"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn to_records_preserves_insertion_order() {
        let mut store = BuildIdStore::new();
        store.observe_record(&record(b"/bin/z", &[1]));
        store.observe_record(&record(b"/bin/a", &[2]));
        let records = store.to_records();
        assert_eq!(records[0].filename, b"/bin/z");
        assert_eq!(records[1].filename, b"/bin/a");
    }

    #[test]
    fn hex_round_trip() {
        let bytes = vec![0x01, 0xff, 0x80];
        assert_eq!(hex_to_bytes(&bytes_to_hex(&bytes)), Some(bytes));
        assert_eq!(hex_to_bytes("xyz"), None);
    }
}
