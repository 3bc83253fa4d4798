//! Ledger - append-only record of applied migrations
//!
//! The ledger is a plain text file with one migration identifier per line.
//! It is read fully when opened and then only ever appended to, one line per
//! successfully executed migration.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::domain::result::{Error, Result};
use crate::domain::MigrationId;

/// Split ledger contents into identifiers, trimming each line
fn parse_entries(contents: &str) -> Vec<String> {
    contents
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// How a failed `try_lock_exclusive` should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockFailure {
    /// Another handle holds the lock
    Contended,
    /// The filesystem cannot lock (e.g. some NFS mounts); run unlocked
    Unsupported,
}

fn classify_lock_error(e: &io::Error) -> LockFailure {
    let contended = fs2::lock_contended_error().raw_os_error();
    if e.raw_os_error().is_some() && e.raw_os_error() == contended {
        LockFailure::Contended
    } else {
        LockFailure::Unsupported
    }
}

/// Open ledger file, exclusively locked for the lifetime of the value
/// where the filesystem supports it
pub struct Ledger {
    path: PathBuf,
    file: Option<File>,
    applied: HashSet<String>,
    entries: Vec<String>,
    /// Last line of the file has no terminating newline yet
    unterminated: bool,
    locked: bool,
}

impl Ledger {
    /// Open the ledger for append, creating it if absent, and load its
    /// contents.
    ///
    /// Fails with `LedgerLocked` if another process already holds it. On
    /// filesystems without lock support the ledger is opened unlocked.
    pub fn open(path: &Path) -> Result<Self> {
        let open_err = |source: io::Error| Error::LedgerOpen {
            path: path.to_path_buf(),
            source,
        };

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .map_err(open_err)?;

        let locked = match file.try_lock_exclusive() {
            Ok(()) => true,
            Err(e) => match classify_lock_error(&e) {
                LockFailure::Contended => {
                    return Err(Error::LedgerLocked {
                        path: path.to_path_buf(),
                    })
                }
                LockFailure::Unsupported => {
                    warn!(
                        ledger = %path.display(),
                        error = %e,
                        "cannot lock ledger, concurrent runs will not be detected"
                    );
                    false
                }
            },
        };

        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(open_err)?;

        let entries = parse_entries(&contents);
        let applied = entries.iter().cloned().collect();
        let unterminated = !contents.is_empty() && !contents.ends_with('\n');
        debug!(ledger = %path.display(), entries = entries.len(), "opened ledger");

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            applied,
            entries,
            unterminated,
            locked,
        })
    }

    /// Read a ledger without creating or locking it.
    ///
    /// A missing file is an empty ledger.
    pub fn read(path: &Path) -> Result<Vec<String>> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(parse_entries(&contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(Error::LedgerOpen {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn contains(&self, id: &MigrationId) -> bool {
        self.applied.contains(id.as_str())
    }

    /// Append `id` and sync it to disk.
    ///
    /// Only call after the migration's command exited successfully. The
    /// in-memory set changes only if the write succeeded. A hand-edited
    /// ledger whose last line lacks a newline gets one first, in the same
    /// write, so that line is never merged with `id`.
    pub fn record(&mut self, id: &MigrationId) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "ledger is closed"))?;

        let line = if self.unterminated {
            format!("\n{}\n", id)
        } else {
            format!("{}\n", id)
        };
        file.write_all(line.as_bytes())?;
        file.sync_data()?;
        self.unterminated = false;

        self.applied.insert(id.as_str().to_string());
        self.entries.push(id.as_str().to_string());
        Ok(())
    }

    /// Identifiers in the order they appear in the file
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this handle holds the exclusive lock
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Flush and release the file handle and its lock. No-op once closed.
    pub fn close(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        Ok(())
    }
}

impl Drop for Ledger {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("migrations.lock");

        let ledger = Ledger::open(&path).unwrap();

        assert!(path.exists());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_open_trims_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("migrations.lock");
        fs::write(&path, "01.sql\n  02.sql \r\n05.sql\n").unwrap();

        let ledger = Ledger::open(&path).unwrap();

        assert_eq!(ledger.entries(), &["01.sql", "02.sql", "05.sql"]);
        assert!(ledger.contains(&MigrationId::new("02.sql")));
        assert!(!ledger.contains(&MigrationId::new("03.sql")));
    }

    #[test]
    fn test_record_appends_and_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("migrations.lock");
        fs::write(&path, "01.sql\n").unwrap();

        let mut ledger = Ledger::open(&path).unwrap();
        ledger.record(&MigrationId::new("02.sql")).unwrap();

        assert!(ledger.contains(&MigrationId::new("02.sql")));
        // Visible on disk before close
        assert_eq!(fs::read_to_string(&path).unwrap(), "01.sql\n02.sql\n");

        ledger.close().unwrap();
        let reopened = Ledger::open(&path).unwrap();
        assert_eq!(reopened.entries(), &["01.sql", "02.sql"]);
    }

    #[test]
    fn test_record_after_unterminated_last_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("migrations.lock");
        fs::write(&path, "01.sql").unwrap();

        let mut ledger = Ledger::open(&path).unwrap();
        ledger.record(&MigrationId::new("02.sql")).unwrap();
        ledger.record(&MigrationId::new("03.sql")).unwrap();
        ledger.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "01.sql\n02.sql\n03.sql\n");
        let reopened = Ledger::open(&path).unwrap();
        assert!(reopened.contains(&MigrationId::new("01.sql")));
        assert!(reopened.contains(&MigrationId::new("02.sql")));
        assert!(reopened.contains(&MigrationId::new("03.sql")));
    }

    #[test]
    fn test_record_after_trailing_whitespace_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("migrations.lock");
        fs::write(&path, "01.sql\n  ").unwrap();

        let mut ledger = Ledger::open(&path).unwrap();
        ledger.record(&MigrationId::new("02.sql")).unwrap();
        ledger.close().unwrap();

        assert_eq!(Ledger::read(&path).unwrap(), vec!["01.sql", "02.sql"]);
    }

    #[test]
    fn test_lock_error_classification() {
        assert_eq!(
            classify_lock_error(&fs2::lock_contended_error()),
            LockFailure::Contended
        );
        assert_eq!(
            classify_lock_error(&io::Error::new(io::ErrorKind::Unsupported, "no flock")),
            LockFailure::Unsupported
        );
    }

    #[test]
    fn test_open_holds_lock() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::open(&dir.path().join("migrations.lock")).unwrap();
        assert!(ledger.is_locked());
    }

    #[test]
    fn test_record_after_close_fails() {
        let dir = tempdir().unwrap();
        let mut ledger = Ledger::open(&dir.path().join("migrations.lock")).unwrap();
        ledger.close().unwrap();

        assert!(ledger.record(&MigrationId::new("01.sql")).is_err());
        assert!(!ledger.contains(&MigrationId::new("01.sql")));
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut ledger = Ledger::open(&dir.path().join("migrations.lock")).unwrap();

        ledger.close().unwrap();
        ledger.close().unwrap();
    }

    #[test]
    fn test_open_fails_when_parent_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("migrations.lock");

        let err = Ledger::open(&path).err().unwrap();
        assert!(matches!(err, Error::LedgerOpen { .. }));
    }

    #[test]
    fn test_second_open_is_locked_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("migrations.lock");

        let mut first = Ledger::open(&path).unwrap();
        let err = Ledger::open(&path).err().unwrap();
        assert!(matches!(err, Error::LedgerLocked { .. }));

        first.close().unwrap();
        assert!(Ledger::open(&path).is_ok());
    }

    #[test]
    fn test_read_does_not_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("migrations.lock");

        assert!(Ledger::read(&path).unwrap().is_empty());
        assert!(!path.exists());

        fs::write(&path, "01.sql\n02.sql\n").unwrap();
        assert_eq!(Ledger::read(&path).unwrap(), vec!["01.sql", "02.sql"]);
    }
}
