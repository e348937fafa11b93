// src/utils/log_file.rs

//! Size-rotated log file.
//!
//! Once the file would grow past `max_bytes` it is renamed to `<file>.1`,
//! older backups shift up to `<file>.N`, and the oldest is dropped.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Append-only file that rotates itself by size.
///
/// Used as a logger target, so it must not log on its own.
pub struct RotatingFile {
    file: File,
    base_path: PathBuf,
    current_size: u64,
    max_bytes: u64,
    max_backups: usize,
}

impl RotatingFile {
    /// Open (or create) `path` for appending, creating parent directories.
    pub fn open(path: impl AsRef<Path>, max_bytes: u64, max_backups: usize) -> io::Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = open_append(path)?;
        let current_size = file.metadata()?.len();

        Ok(Self {
            file,
            base_path: path.to_path_buf(),
            current_size,
            max_bytes,
            max_backups,
        })
    }

    pub fn path(&self) -> &Path {
        &self.base_path
    }

    /// `<file>.<index>`
    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.base_path.as_os_str().to_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.max_backups == 0 {
            self.file = File::create(&self.base_path)?;
            self.current_size = 0;
            return Ok(());
        }

        let oldest = self.backup_path(self.max_backups);
        if oldest.exists() {
            std::fs::remove_file(&oldest)?;
        }
        for i in (1..self.max_backups).rev() {
            let old_path = self.backup_path(i);
            if old_path.exists() {
                std::fs::rename(&old_path, self.backup_path(i + 1))?;
            }
        }
        if self.base_path.exists() {
            std::fs::rename(&self.base_path, self.backup_path(1))?;
        }

        self.file = open_append(&self.base_path)?;
        self.current_size = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let incoming = buf.len() as u64;
        if self.current_size > 0 && self.current_size + incoming > self.max_bytes {
            self.rotate()?;
        }

        self.file.write_all(buf)?;
        self.current_size += incoming;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_appends_below_limit() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logs/notifier.log");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "earlier\n").unwrap();

        let mut file = RotatingFile::open(&path, 1024, 3).unwrap();
        file.write_all(b"later\n").unwrap();

        assert_eq!(read(&path), "earlier\nlater\n");
        assert!(!file.backup_path(1).exists());
    }

    #[test]
    fn test_rotates_when_full() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notifier.log");
        let mut file = RotatingFile::open(&path, 10, 3).unwrap();

        file.write_all(b"line-one\n").unwrap();
        file.write_all(b"line-two\n").unwrap();

        assert_eq!(read(&path), "line-two\n");
        assert_eq!(read(&tmp.path().join("notifier.log.1")), "line-one\n");
    }

    #[test]
    fn test_keeps_at_most_max_backups() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notifier.log");
        let mut file = RotatingFile::open(&path, 4, 2).unwrap();

        for line in ["aaa\n", "bbb\n", "ccc\n", "ddd\n"] {
            file.write_all(line.as_bytes()).unwrap();
        }

        assert_eq!(read(&path), "ddd\n");
        assert_eq!(read(&tmp.path().join("notifier.log.1")), "ccc\n");
        assert_eq!(read(&tmp.path().join("notifier.log.2")), "bbb\n");
        assert!(!tmp.path().join("notifier.log.3").exists());
    }

    #[test]
    fn test_existing_size_counts_towards_limit() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notifier.log");
        std::fs::write(&path, "0123456789").unwrap();

        let mut file = RotatingFile::open(&path, 12, 1).unwrap();
        file.write_all(b"next\n").unwrap();

        assert_eq!(read(&path), "next\n");
        assert_eq!(read(&tmp.path().join("notifier.log.1")), "0123456789");
    }

    #[test]
    fn test_zero_backups_truncates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notifier.log");
        let mut file = RotatingFile::open(&path, 4, 0).unwrap();

        file.write_all(b"old\n").unwrap();
        file.write_all(b"new\n").unwrap();

        assert_eq!(read(&path), "new\n");
        assert!(!tmp.path().join("notifier.log.1").exists());
    }

    #[test]
    fn test_oversized_line_is_written_whole() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notifier.log");
        let mut file = RotatingFile::open(&path, 4, 1).unwrap();

        file.write_all(b"a very long line\n").unwrap();

        assert_eq!(read(&path), "a very long line\n");
    }
}
