// Sealgate — Storage Adapter
//
// Whole-file reads and writes for sealed buffers. Every persisted file
// is a raw byte dump of exactly one sealed buffer: no header, no length
// prefix, no checksum. The file's length is the buffer's size, and
// compatibility requires that no framing ever be added.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;

/// Why a write did not complete. The two cases propagate differently:
/// a destination that cannot even be opened aborts a batched save,
/// while a short write is recorded and the batch continues.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("open failed: {0}")]
    Open(io::Error),

    #[error("write incomplete: {0}")]
    Write(io::Error),
}

/// Read an entire file into a freshly allocated buffer.
///
/// All-or-nothing: either the full content is returned or an error is;
/// a partially populated buffer can never escape this function.
pub fn read_to_buffer(path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
}

/// Write `bytes` in full to `path`, creating or truncating the file.
///
/// The handle is closed on every exit path. A failed write may leave a
/// partially written file behind; callers treat the returned error as
/// "output is unreliable" rather than expecting a rollback.
pub fn write_buffer(path: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    let mut file = File::create(path).map_err(WriteError::Open)?;
    file.write_all(bytes).map_err(WriteError::Write)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_read_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blob.bin");

        write_buffer(&path, &[1, 2, 3, 4, 5]).unwrap();
        let read = read_to_buffer(&path).unwrap();
        assert_eq!(read, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_read_missing_file_fails() {
        let dir = tempdir().unwrap();
        let result = read_to_buffer(&dir.path().join("absent.bin"));
        assert!(result.is_err());
    }

    #[test]
    fn test_write_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blob.bin");

        write_buffer(&path, &[0xaa; 64]).unwrap();
        write_buffer(&path, &[0xbb; 8]).unwrap();

        let read = read_to_buffer(&path).unwrap();
        assert_eq!(read, vec![0xbb; 8], "Old content must not survive");
    }

    #[test]
    fn test_write_to_unopenable_path_is_open_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("blob.bin");

        let err = write_buffer(&path, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, WriteError::Open(_)));
    }

    #[test]
    fn test_empty_write_produces_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.bin");

        write_buffer(&path, &[]).unwrap();
        assert_eq!(read_to_buffer(&path).unwrap().len(), 0);
    }
}
