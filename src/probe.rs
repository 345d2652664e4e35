use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::address_map::InodeInfo;

/// Device and inode identity of a probed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub dev_major: u32,
    pub dev_minor: u32,
    pub ino: u64,
}

/// The narrow filesystem interface the build-ID probe goes through.
///
/// Implementations own the actual I/O and the ELF note extraction; both are
/// blocking calls and should be time-bounded per file by the implementor.
/// The probe logic here only decides which paths to try, in which order,
/// and which results to accept.
pub trait FileSystemProbe {
    fn stat(&self, path: &Path) -> io::Result<FileStat>;
    /// Extract the build ID from the ELF file at `path`.
    fn read_build_id(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// A [`FileSystemProbe`] over the local filesystem. The stat side uses the
/// standard library; build-ID extraction is left to the consumer, which
/// wraps this (or replaces it) with its ELF reader of choice.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystemProbe for LocalFs {
    #[cfg(unix)]
    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        use std::os::unix::fs::MetadataExt;
        let metadata = std::fs::metadata(path)?;
        let dev = metadata.dev();
        // Linux dev_t encoding.
        let dev_major = ((dev >> 8) & 0xfff) as u32 | ((dev >> 32) & !0xfff) as u32;
        let dev_minor = (dev & 0xff) as u32 | ((dev >> 12) & 0xffff_ff00) as u32;
        Ok(FileStat {
            dev_major,
            dev_minor,
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    fn stat(&self, _path: &Path) -> io::Result<FileStat> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn read_build_id(&self, _path: &Path) -> io::Result<Vec<u8>> {
        Err(io::ErrorKind::Unsupported.into())
    }
}

/// Whether a mapping filename denotes something that exists on disk at all.
/// Pseudo entries like `[vdso]`, `[stack]` or `//anon` never do.
pub fn is_probeable_filename(filename: &[u8]) -> bool {
    !filename.is_empty() && !filename.starts_with(b"[") && !filename.starts_with(b"//")
}

/// Find the build ID for `filename` as seen by the recorded process.
///
/// The file is looked up through the thread's mount namespace first, then
/// the process's, then the root filesystem. A candidate is accepted when
/// its `(major, minor, inode)` matches the identity recorded in the MMAP2
/// event; without recorded identity, the first readable candidate wins
/// (a known-fallible fallback). Probe failures are swallowed: the caller
/// emits the sample without a build ID.
pub fn probe_build_id(
    probe: &dyn FileSystemProbe,
    filename: &[u8],
    tid: u32,
    pid: u32,
    inode: Option<InodeInfo>,
) -> Option<Vec<u8>> {
    if !is_probeable_filename(filename) {
        return None;
    }
    let file = Path::new(std::str::from_utf8(filename).ok()?);

    let mut candidates: Vec<PathBuf> = Vec::with_capacity(3);
    for ns_pid in [tid, pid] {
        let mut path = PathBuf::from(format!("/proc/{ns_pid}/root"));
        path.push(file.strip_prefix("/").unwrap_or(file));
        if !candidates.contains(&path) {
            candidates.push(path);
        }
    }
    candidates.push(file.to_path_buf());

    for candidate in candidates {
        if let Some(inode) = inode {
            let stat = match probe.stat(&candidate) {
                Ok(stat) => stat,
                Err(err) => {
                    debug!("stat {:?} failed: {}", candidate, err);
                    continue;
                }
            };
            if stat.dev_major != inode.maj || stat.dev_minor != inode.min || stat.ino != inode.ino
            {
                continue;
            }
        }
        match probe.read_build_id(&candidate) {
            Ok(build_id) if !build_id.is_empty() => return Some(build_id),
            Ok(_) => continue,
            Err(err) => {
                debug!("build ID probe of {:?} failed: {}", candidate, err);
                continue;
            }
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;

    struct FakeFs {
        files: Vec<(PathBuf, FileStat, Vec<u8>)>,
        probed: RefCell<Vec<PathBuf>>,
    }

    impl FileSystemProbe for FakeFs {
        fn stat(&self, path: &Path) -> io::Result<FileStat> {
            self.probed.borrow_mut().push(path.to_path_buf());
            self.files
                .iter()
                .find(|(p, _, _)| p == path)
                .map(|(_, stat, _)| *stat)
                .ok_or_else(|| io::ErrorKind::NotFound.into())
        }

        fn read_build_id(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.files
                .iter()
                .find(|(p, _, _)| p == path)
                .map(|(_, _, id)| id.clone())
                .ok_or_else(|| io::ErrorKind::NotFound.into())
        }
    }

    fn stat(ino: u64) -> FileStat {
        FileStat {
            dev_major: 8,
            dev_minor: 1,
            ino,
        }
    }

    #[test]
    fn tid_namespace_takes_precedence() {
        let fs = FakeFs {
            files: vec![
                (PathBuf::from("/proc/11/root/lib/a.so"), stat(5), vec![0xaa]),
                (PathBuf::from("/proc/10/root/lib/a.so"), stat(5), vec![0xbb]),
                (PathBuf::from("/lib/a.so"), stat(5), vec![0xcc]),
            ],
            probed: RefCell::new(Vec::new()),
        };
        let id = probe_build_id(&fs, b"/lib/a.so", 11, 10, None);
        assert_eq!(id, Some(vec![0xaa]));
    }

    #[test]
    fn inode_mismatch_rejects_candidate() {
        let fs = FakeFs {
            files: vec![
                (PathBuf::from("/proc/11/root/lib/a.so"), stat(99), vec![0xaa]),
                (PathBuf::from("/lib/a.so"), stat(5), vec![0xcc]),
            ],
            probed: RefCell::new(Vec::new()),
        };
        let inode = InodeInfo {
            maj: 8,
            min: 1,
            ino: 5,
            ino_generation: 0,
        };
        let id = probe_build_id(&fs, b"/lib/a.so", 11, 11, Some(inode));
        assert_eq!(id, Some(vec![0xcc]));
    }

    #[test]
    fn pseudo_files_are_not_probed() {
        let fs = FakeFs {
            files: vec![],
            probed: RefCell::new(Vec::new()),
        };
        assert_eq!(probe_build_id(&fs, b"[vdso]", 1, 1, None), None);
        assert_eq!(probe_build_id(&fs, b"//anon", 1, 1, None), None);
        assert!(fs.probed.borrow().is_empty());
    }
}
