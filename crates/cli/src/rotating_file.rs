//! Size-based log file rotation.
//!
//! `log.log` is rotated once it would grow past `max_bytes`, keeping at most
//! `backups` older copies:
//!   log.log → log.log.1 → log.log.2 → … → log.log.<backups>

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// An append-only log file that rotates itself by size.
pub struct RotatingFile {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    backups: usize,
}

impl RotatingFile {
    /// Open (or create) the log file for appending.
    ///
    /// A file already over the threshold is rotated first.
    pub fn open(path: &Path, max_bytes: u64, backups: usize) -> io::Result<Self> {
        rotate_if_needed(path, max_bytes, backups)?;
        let file = open_append(path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            file,
            written,
            max_bytes,
            backups,
        })
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        shift_backups(&self.path, self.backups)?;
        self.file = open_append(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Rotate `log_path` if its size is at least `max_bytes`.
///
/// Returns `true` if rotation occurred. A missing file is not an error.
pub fn rotate_if_needed(log_path: &Path, max_bytes: u64, backups: usize) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if size < max_bytes {
        return Ok(false);
    }
    shift_backups(log_path, backups)?;
    Ok(true)
}

/// Move `<name>` to `<name>.1`, shifting older copies up and dropping the
/// oldest. With zero backups the live file is simply removed.
fn shift_backups(log_path: &Path, backups: usize) -> io::Result<()> {
    if backups == 0 {
        return match fs::remove_file(log_path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        };
    }

    let oldest = numbered_path(log_path, backups);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for n in (1..backups).rev() {
        let src = numbered_path(log_path, n);
        if src.exists() {
            fs::rename(&src, numbered_path(log_path, n + 1))?;
        }
    }
    if log_path.exists() {
        fs::rename(log_path, numbered_path(log_path, 1))?;
    }
    Ok(())
}

/// Path of the `n`-th rotated copy of `base` (e.g. `log.log.2`).
fn numbered_path(base: &Path, n: usize) -> PathBuf {
    let name = base
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("log.log");
    base.with_file_name(format!("{name}.{n}"))
}
