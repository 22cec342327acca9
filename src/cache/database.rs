//! SQLite-backed metadata store.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

use rusqlite::{params, Connection, OptionalExtension};

use super::entry::CacheEntry;
use crate::scanner::Digest;

/// Current schema version, stored in `PRAGMA user_version`.
const SCHEMA_VERSION: i64 = 2;

/// Errors raised by the metadata store.
///
/// None of these are fatal to duplicate detection: callers log them and
/// carry on as if the store were absent.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// SQLite reported an error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The store's directory could not be created.
    #[error("Failed to create store directory {path}: {source}")]
    Io {
        /// Directory that could not be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A worker panicked while holding the connection.
    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Persistent path -> (size, mtime, digest) store.
///
/// Rows are keyed by the path's raw OS bytes, so paths that are not valid
/// UTF-8 never share a row. The connection sits behind a mutex so worker
/// threads can read and upsert concurrently; SQLite sees one writer at a
/// time.
pub struct HashCache {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for HashCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashCache")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl HashCache {
    /// Open or create the store at `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the directory or database cannot be
    /// created, or the schema cannot be initialised.
    pub fn open(path: &Path) -> CacheResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        let cache = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        cache.configure_pragmas()?;
        cache.migrate_schema()?;
        log::debug!("Opened metadata store at {}", path.display());
        Ok(cache)
    }

    /// Open a private in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the schema cannot be initialised.
    pub fn open_in_memory() -> CacheResult<Self> {
        let cache = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            path: None,
        };
        cache.configure_pragmas()?;
        cache.migrate_schema()?;
        Ok(cache)
    }

    /// Default store location in the platform cache directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "dedupe")
            .map(|dirs| dirs.cache_dir().join("metadata.db"))
    }

    /// Location of the database file, `None` for in-memory stores.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    fn configure_pragmas(&self) -> CacheResult<()> {
        self.lock()?.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Create the schema, dropping rows from older layouts.
    fn migrate_schema(&self) -> CacheResult<()> {
        let conn = self.lock()?;
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version != 0 && version < SCHEMA_VERSION {
            log::debug!(
                "Store schema version {} < {}, recreating",
                version,
                SCHEMA_VERSION
            );
            conn.execute_batch("DROP TABLE IF EXISTS files;")?;
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS files (
                 path         BLOB PRIMARY KEY,
                 size         INTEGER NOT NULL,
                 mtime_ns     INTEGER NOT NULL,
                 content_hash INTEGER NOT NULL,
                 updated_at   INTEGER NOT NULL
             );",
        )?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    /// Stored digest for `path`, if its size and mtime still match.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the query fails.
    pub fn get_hash(
        &self,
        path: &Path,
        size: u64,
        modified: SystemTime,
    ) -> CacheResult<Option<Digest>> {
        let conn = self.lock()?;
        let row: Option<(i64, i64, i64)> = conn
            .query_row(
                "SELECT size, mtime_ns, content_hash FROM files WHERE path = ?1",
                params![path_key(path)],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        Ok(row.and_then(|(stored_size, mtime_ns, hash)| {
            let entry = CacheEntry {
                path: path.to_path_buf(),
                size: stored_size as u64,
                mtime_ns,
                content_hash: hash as u64,
            };
            if entry.is_valid_for(size, modified) {
                Some(entry.content_hash)
            } else {
                log::trace!("Stale store entry: {}", path.display());
                None
            }
        }))
    }

    /// Insert or replace the row for an entry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the write fails.
    pub fn insert_hash(&self, entry: &CacheEntry) -> CacheResult<()> {
        self.lock()?.execute(
            "INSERT INTO files (path, size, mtime_ns, content_hash, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(path) DO UPDATE SET
                 size = excluded.size,
                 mtime_ns = excluded.mtime_ns,
                 content_hash = excluded.content_hash,
                 updated_at = excluded.updated_at",
            params![
                path_key(&entry.path),
                entry.size as i64,
                entry.mtime_ns,
                entry.content_hash as i64,
                chrono::Utc::now().timestamp(),
            ],
        )?;
        Ok(())
    }

    /// Stored entry for `path` regardless of freshness.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the query fails.
    pub fn get_entry(&self, path: &Path) -> CacheResult<Option<CacheEntry>> {
        let conn = self.lock()?;
        let entry = conn
            .query_row(
                "SELECT size, mtime_ns, content_hash FROM files WHERE path = ?1",
                params![path_key(path)],
                |row| {
                    Ok(CacheEntry {
                        path: path.to_path_buf(),
                        size: row.get::<_, i64>(0)? as u64,
                        mtime_ns: row.get(1)?,
                        content_hash: row.get::<_, i64>(2)? as u64,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    /// Remove every row. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the delete fails.
    pub fn clear(&self) -> CacheResult<usize> {
        let removed = self.lock()?.execute("DELETE FROM files", [])?;
        log::info!("Cleared {} entries from metadata store", removed);
        Ok(removed)
    }

    /// Number of stored rows.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the query fails.
    pub fn len(&self) -> CacheResult<usize> {
        let count: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Whether the store holds no rows.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the query fails.
    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove rows for paths that no longer exist. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the store cannot be read or written.
    pub fn prune(&self) -> CacheResult<usize> {
        let conn = self.lock()?;
        let keys: Vec<Vec<u8>> = {
            let mut stmt = conn.prepare("SELECT path FROM files")?;
            let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;
            let collected = rows.collect::<Result<Vec<_>, _>>()?;
            collected
        };

        let mut removed = 0;
        for key in &keys {
            if !path_from_key(key).is_some_and(|path| path.exists()) {
                removed += conn.execute("DELETE FROM files WHERE path = ?1", params![key])?;
            }
        }

        log::debug!("Pruned {} missing paths from metadata store", removed);
        Ok(removed)
    }
}

#[cfg(unix)]
fn path_key(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(unix)]
fn path_from_key(key: &[u8]) -> Option<PathBuf> {
    use std::os::unix::ffi::OsStrExt;
    Some(PathBuf::from(std::ffi::OsStr::from_bytes(key)))
}

// UTF-16 code units, little-endian; unpaired surrogates survive.
#[cfg(windows)]
fn path_key(path: &Path) -> Vec<u8> {
    use std::os::windows::ffi::OsStrExt;
    path.as_os_str()
        .encode_wide()
        .flat_map(u16::to_le_bytes)
        .collect()
}

#[cfg(windows)]
fn path_from_key(key: &[u8]) -> Option<PathBuf> {
    use std::os::windows::ffi::OsStringExt;
    if key.len() % 2 != 0 {
        return None;
    }
    let wide: Vec<u16> = key
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Some(PathBuf::from(std::ffi::OsString::from_wide(&wide)))
}

#[cfg(not(any(unix, windows)))]
fn path_key(path: &Path) -> Vec<u8> {
    path.as_os_str().as_encoded_bytes().to_vec()
}

#[cfg(not(any(unix, windows)))]
fn path_from_key(key: &[u8]) -> Option<PathBuf> {
    std::str::from_utf8(key).ok().map(PathBuf::from)
}
