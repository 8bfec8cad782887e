//! Fixed-size binary pidfile records.
//!
//! A pidfile holds exactly one [`PidRecord`]: the native-endian bytes of a
//! `u32` process identifier, with no header or checksum.

use std::{
    fs::{self, File},
    io::{self, Read, Write},
    path::Path,
};

use tracing::debug;

use super::error::PidfileError;

/// Number of bytes in one encoded record.
pub const RECORD_LEN: usize = size_of::<u32>();

/// The on-disk content of a pidfile.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PidRecord {
    pub pid: u32,
}

impl PidRecord {
    #[must_use]
    pub const fn new(pid: u32) -> Self {
        Self { pid }
    }

    #[must_use]
    pub const fn encode(self) -> [u8; RECORD_LEN] {
        self.pid.to_ne_bytes()
    }

    /// Decode the first [`RECORD_LEN`] bytes. Returns `None` when `bytes` is
    /// shorter than one record; trailing bytes are ignored.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let head: [u8; RECORD_LEN] = bytes.get(..RECORD_LEN)?.try_into().ok()?;
        Some(Self::new(u32::from_ne_bytes(head)))
    }
}

/// Read the record at `path`.
///
/// Returns `Ok(None)` if the file does not exist.
///
/// # Errors
/// [`PidfileError::CorruptRecord`] if the file holds less than one record,
/// [`PidfileError::Io`] for any other open or read failure.
pub fn read(path: &Path) -> Result<Option<PidRecord>, PidfileError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no pidfile");
            return Ok(None);
        }
        Err(e) => return Err(PidfileError::io(path, e)),
    };

    let mut buf = Vec::with_capacity(RECORD_LEN);
    file.take(RECORD_LEN as u64)
        .read_to_end(&mut buf)
        .map_err(|e| PidfileError::io(path, e))?;

    let record = PidRecord::decode(&buf).ok_or_else(|| PidfileError::CorruptRecord {
        path: path.to_path_buf(),
        len: buf.len(),
        expected: RECORD_LEN,
    })?;
    debug!(path = %path.display(), pid = record.pid, "read pidfile");
    Ok(Some(record))
}

/// Write `record` to `path`, truncating any previous content.
///
/// # Errors
/// [`PidfileError::Io`] if the file cannot be created, written or flushed.
pub fn write(path: &Path, record: PidRecord) -> Result<(), PidfileError> {
    let mut file = File::create(path).map_err(|e| PidfileError::io(path, e))?;
    file.write_all(&record.encode())
        .and_then(|()| file.flush())
        .map_err(|e| PidfileError::io(path, e))?;
    debug!(path = %path.display(), pid = record.pid, "wrote pidfile");
    Ok(())
}

/// Delete the pidfile. A missing file is not an error.
///
/// # Errors
/// [`PidfileError::Io`] if unlinking fails for any reason other than absence.
pub fn remove(path: &Path) -> Result<(), PidfileError> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed pidfile");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PidfileError::io(path, e)),
    }
}
