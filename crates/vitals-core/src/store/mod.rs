//! The encrypted store.
//!
//! The SQLite database lives in memory on a dedicated worker thread. On
//! persist it is serialized, encrypted with the vault key and written to
//! disk atomically; on open the file is decrypted and deserialized.
//! Callers talk to the worker through a cloneable [`StoreHandle`].

mod encryption;
mod schema;
mod seed;
mod statement;
mod worker;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use once_cell::sync::OnceCell;
use rusqlite::serialize::OwnedData;
use rusqlite::{Connection, DatabaseName, OptionalExtension};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::error::{Result, VitalsError};
use crate::fs::write_atomic;
use crate::key::{EncryptionKey, KeyManager};
use crate::session::UserId;

pub use encryption::{decrypt, encrypt};
pub use schema::{TableName, FORMAT_VERSION};
pub use seed::SeedMode;
pub use statement::{QueryOutcome, Row, ScopedStatement, SESSION_PARAM};
pub use worker::Pending;

use statement::run_scoped;
use worker::Job;

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Age-encrypted file on disk.
    File(PathBuf),
    /// Ephemeral; never written anywhere.
    Memory,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// Permits [`StoreConfig::reset_guard`]. Off unless configured.
    pub allow_reset: bool,
}

impl StoreConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            allow_reset: false,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            allow_reset: false,
        }
    }

    pub fn with_reset(mut self, allow: bool) -> Self {
        self.allow_reset = allow;
        self
    }

    /// Permission to drop tables.
    pub fn reset_guard(&self) -> Result<ResetGuard> {
        if self.allow_reset {
            Ok(ResetGuard { _private: () })
        } else {
            Err(VitalsError::ResetDisabled)
        }
    }
}

/// Proof that destructive resets were enabled in configuration.
#[derive(Debug)]
pub struct ResetGuard {
    _private: (),
}

/// Lazily initialized store slot shared by a composition root.
#[derive(Debug)]
pub struct StoreCell {
    config: StoreConfig,
    handle: OnceCell<StoreHandle>,
}

impl StoreCell {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            handle: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Open the store on first call; later calls return the same handle.
    pub fn initialize(&self, keys: &KeyManager) -> Result<StoreHandle> {
        self.handle
            .get_or_try_init(|| {
                let key = keys.retrieve_or_create_key()?;
                StoreHandle::open(&self.config, key)
            })
            .cloned()
    }

    pub fn get(&self) -> Result<StoreHandle> {
        self.handle
            .get()
            .cloned()
            .ok_or(VitalsError::StoreNotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.get().is_some()
    }
}

/// State owned by the worker thread.
pub(crate) struct StoreState {
    conn: Connection,
    location: StoreLocation,
    key: EncryptionKey,
    dirty: bool,
    closing: bool,
}

impl StoreState {
    /// Write the store if it changed since the last write.
    fn persist(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        let path = match &self.location {
            StoreLocation::File(path) => path,
            StoreLocation::Memory => {
                self.dirty = false;
                return Ok(false);
            }
        };

        let data = self.conn.serialize(DatabaseName::Main)?;
        let encrypted = encrypt(&data, &self.key)?;
        write_atomic(path, &encrypted, true)?;
        self.dirty = false;
        info!(path = %path.display(), bytes = encrypted.len(), "persisted store");
        Ok(true)
    }
}

/// Handle to the store worker. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    jobs: mpsc::UnboundedSender<Job>,
}

impl StoreHandle {
    /// Open the store at `config.location`, creating it if absent.
    ///
    /// # Errors
    ///
    /// `IncorrectKey` when an existing file does not decrypt with `key`.
    pub fn open(config: &StoreConfig, key: EncryptionKey) -> Result<Self> {
        let (conn, created) = match &config.location {
            StoreLocation::File(path) if path.exists() => (load(path, &key)?, false),
            StoreLocation::File(path) => {
                info!(path = %path.display(), "creating new store");
                (Connection::open_in_memory()?, true)
            }
            StoreLocation::Memory => (Connection::open_in_memory()?, true),
        };
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let mut state = StoreState {
            conn,
            location: config.location.clone(),
            key,
            dirty: false,
            closing: false,
        };

        let before = schema::table_names(&state.conn)?;
        schema::ensure_schema(&mut state.conn)?;
        if created || schema::table_names(&state.conn)? != before {
            state.dirty = true;
        }
        state.persist()?;

        let jobs = worker::spawn(state)?;
        Ok(Self { jobs })
    }

    /// Queue `f` on the worker.
    pub(crate) fn call<T, F>(&self, f: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut StoreState) -> Result<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |state| {
            let _ = tx.send(f(state));
        });
        // A rejected job drops its sender, which resolves the receiver
        // with `WorkerStopped`.
        if self.jobs.send(job).is_err() {
            debug!("store worker is gone, job rejected");
        }
        Pending::new(rx)
    }

    /// Create missing tables and indexes.
    pub fn ensure_schema(&self) -> Pending<()> {
        self.call(|state| {
            let before = schema::table_names(&state.conn)?;
            schema::ensure_schema(&mut state.conn)?;
            if schema::table_names(&state.conn)? != before {
                state.dirty = true;
            }
            Ok(())
        })
    }

    pub fn table_names(&self) -> Pending<Vec<String>> {
        self.call(|state| schema::table_names(&state.conn))
    }

    /// Rows in `table` across all users.
    pub fn row_count(&self, table: TableName) -> Pending<i64> {
        self.call(move |state| {
            let sql = format!("SELECT COUNT(*) FROM {}", table.as_str());
            Ok(state.conn.query_row(&sql, [], |row| row.get(0))?)
        })
    }

    pub fn seed_sample_data(&self, mode: SeedMode) -> Pending<usize> {
        self.call(move |state| {
            let inserted = seed::seed_sample_data(&mut state.conn, mode)?;
            state.dirty = true;
            Ok(inserted)
        })
    }

    /// Drop the existing tables among `tables`, children first.
    pub fn drop_tables(
        &self,
        tables: BTreeSet<TableName>,
        _guard: &ResetGuard,
    ) -> Pending<Vec<TableName>> {
        self.call(move |state| {
            let dropped = schema::drop_tables(&mut state.conn, &tables)?;
            if !dropped.is_empty() {
                state.dirty = true;
            }
            Ok(dropped)
        })
    }

    pub fn check_integrity(&self) -> Pending<()> {
        self.call(|state| schema::check_integrity(&state.conn))
    }

    /// Write pending changes. Resolves to whether anything was written.
    pub fn persist(&self) -> Pending<bool> {
        self.call(StoreState::persist)
    }

    /// Persist and stop the worker. Other clones fail with `WorkerStopped`
    /// afterwards.
    pub async fn close(self) -> Result<()> {
        self.call(|state| {
            state.closing = true;
            state.persist().map(|_| ())
        })
        .await
    }

    /// Add a user row. `password_hash` must already be hashed.
    pub(crate) fn insert_user(&self, username: String, password_hash: String) -> Pending<UserId> {
        self.call(move |state| {
            let inserted = state.conn.execute(
                "INSERT INTO user_table (username, password) VALUES (?1, ?2)",
                (&username, &password_hash),
            );
            match inserted {
                Ok(_) => {
                    state.dirty = true;
                    let id = UserId::new(state.conn.last_insert_rowid());
                    info!(user = %id, "registered user");
                    Ok(id)
                }
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Err(VitalsError::InvalidInput(format!(
                        "Username already taken: {}",
                        username
                    )))
                }
                Err(err) => Err(err.into()),
            }
        })
    }

    /// Id and stored password hash for `username`, compared case-insensitively.
    pub(crate) fn find_user(&self, username: String) -> Pending<Option<(UserId, String)>> {
        self.call(move |state| {
            let found = state
                .conn
                .query_row(
                    "SELECT user_id, password FROM user_table WHERE username = ?1",
                    [&username],
                    |row| Ok((UserId::new(row.get(0)?), row.get(1)?)),
                )
                .optional()?;
            Ok(found)
        })
    }

    pub(crate) fn run(&self, statement: ScopedStatement, user: UserId) -> Pending<QueryOutcome> {
        self.call(move |state| {
            debug!(sql = statement.sql(), user = %user, "running statement");
            match run_scoped(&state.conn, &statement, user) {
                Ok(outcome) => {
                    if outcome.wrote {
                        state.dirty = true;
                    }
                    Ok(outcome)
                }
                Err(err) => {
                    warn!(sql = statement.sql(), error = %err, "statement failed");
                    Err(err)
                }
            }
        })
    }

    /// Run `statements` in order inside one transaction.
    pub(crate) fn run_batch(
        &self,
        statements: Vec<ScopedStatement>,
        user: UserId,
    ) -> Pending<Vec<QueryOutcome>> {
        self.call(move |state| {
            debug!(count = statements.len(), user = %user, "running batch");
            let tx = state.conn.transaction()?;
            let mut outcomes = Vec::with_capacity(statements.len());
            for (index, statement) in statements.iter().enumerate() {
                match run_scoped(&tx, statement, user) {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(source) => {
                        warn!(index, sql = statement.sql(), error = %source, "batch aborted");
                        return Err(VitalsError::BatchAborted {
                            index,
                            source: Box::new(source),
                        });
                    }
                }
            }
            tx.commit()?;
            if outcomes.iter().any(|outcome| outcome.wrote) {
                state.dirty = true;
            }
            Ok(outcomes)
        })
    }
}

fn load(path: &Path, key: &EncryptionKey) -> Result<Connection> {
    let encrypted = fs::read(path)?;
    let plaintext = Zeroizing::new(decrypt(&encrypted, key)?);
    let mut conn = Connection::open_in_memory()?;
    conn.deserialize(DatabaseName::Main, owned_data_from_bytes(&plaintext)?, false)?;
    info!(path = %path.display(), "opened store");
    Ok(conn)
}

fn owned_data_from_bytes(bytes: &[u8]) -> Result<OwnedData> {
    if bytes.is_empty() {
        return Err(VitalsError::Storage("Store payload is empty".to_string()));
    }

    let size: i32 = bytes
        .len()
        .try_into()
        .map_err(|_| VitalsError::Storage("Store payload too large".to_string()))?;

    // SAFETY: sqlite3_malloc returns a valid pointer or null; null is
    // checked below. `size` fits in i32.
    let raw = unsafe { rusqlite::ffi::sqlite3_malloc(size) as *mut u8 };
    let ptr = NonNull::new(raw)
        .ok_or_else(|| VitalsError::Storage("SQLite allocation failed".to_string()))?;

    // SAFETY:
    // - `ptr` was just allocated with exactly `bytes.len()` bytes and is non-null
    // - `bytes` is valid for reads of `bytes.len()` bytes
    // - the regions cannot overlap, `ptr` is fresh heap memory
    // - `OwnedData` takes over the sqlite3_malloc'd buffer and frees it
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), bytes.len());
        Ok(OwnedData::from_raw_nonnull(ptr, bytes.len()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::vault::{MemoryVault, SecretVault};

    fn key() -> EncryptionKey {
        EncryptionKey::generate().unwrap()
    }

    fn scoped_insert(user: &str) -> ScopedStatement {
        ScopedStatement::new(
            "INSERT INTO user_table (username, password) SELECT ?, 'x' WHERE :user_id IS NOT NULL",
        )
        .bind(user.to_string())
    }

    #[test]
    fn test_cell_requires_initialize() {
        let cell = StoreCell::new(StoreConfig::in_memory());
        assert!(matches!(cell.get(), Err(VitalsError::StoreNotInitialized)));
        assert!(!cell.is_initialized());
    }

    #[tokio::test]
    async fn test_memory_store_has_schema() {
        let handle = StoreHandle::open(&StoreConfig::in_memory(), key()).unwrap();
        let tables = handle.table_names().await.unwrap();
        for table in TableName::ALL {
            assert!(tables.contains(&table.as_str().to_string()));
        }
        handle.ensure_schema().await.unwrap();
        assert_eq!(handle.table_names().await.unwrap(), tables);
        handle.check_integrity().await.unwrap();
    }

    #[tokio::test]
    async fn test_batch_is_all_or_nothing() {
        let handle = StoreHandle::open(&StoreConfig::in_memory(), key()).unwrap();
        let user = UserId::new(1);

        let batch = vec![
            scoped_insert("a"),
            scoped_insert("b"),
            scoped_insert("A"),
            scoped_insert("c"),
            scoped_insert("d"),
        ];
        let err = handle.run_batch(batch, user).await.unwrap_err();
        assert!(matches!(err, VitalsError::BatchAborted { index: 2, .. }));
        assert_eq!(handle.row_count(TableName::User).await.unwrap(), 0);

        let outcomes = handle
            .run_batch(vec![scoped_insert("a"), scoped_insert("b")], user)
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(handle.row_count(TableName::User).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reset_requires_guard() {
        let config = StoreConfig::in_memory();
        assert!(matches!(
            config.reset_guard(),
            Err(VitalsError::ResetDisabled)
        ));

        let config = config.with_reset(true);
        let guard = config.reset_guard().unwrap();
        let handle = StoreHandle::open(&config, key()).unwrap();
        let tables: BTreeSet<_> = [TableName::Heart].into_iter().collect();
        let dropped = handle.drop_tables(tables, &guard).await.unwrap();
        assert_eq!(dropped, vec![TableName::Heart]);
        assert!(!handle
            .table_names()
            .await
            .unwrap()
            .contains(&"heart_table".to_string()));
    }

    #[tokio::test]
    async fn test_closed_store_rejects_jobs() {
        let handle = StoreHandle::open(&StoreConfig::in_memory(), key()).unwrap();
        let other = handle.clone();
        handle.close().await.unwrap();

        assert!(matches!(
            other.table_names().await,
            Err(VitalsError::WorkerStopped)
        ));
    }

    #[tokio::test]
    async fn test_dropped_pending_still_runs() {
        let handle = StoreHandle::open(&StoreConfig::in_memory(), key()).unwrap();
        drop(handle.run(scoped_insert("fire"), UserId::new(1)));
        assert_eq!(handle.row_count(TableName::User).await.unwrap(), 1);
    }

    /// Memory vault that counts writes.
    #[derive(Default)]
    struct CountingVault {
        inner: MemoryVault,
        writes: AtomicUsize,
    }

    impl SecretVault for CountingVault {
        fn get(&self, name: &str) -> Result<Option<String>> {
            self.inner.get(name)
        }

        fn set(&self, name: &str, value: &str) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(name, value)
        }

        fn clear(&self, name: &str) -> Result<()> {
            self.inner.clear(name)
        }
    }

    #[tokio::test]
    async fn test_initialize_returns_one_shared_store() {
        let vault = Arc::new(CountingVault::default());
        let keys = KeyManager::new(vault.clone());
        let cell = StoreCell::new(StoreConfig::in_memory());

        let first = cell.initialize(&keys).unwrap();
        let second = cell.initialize(&keys).unwrap();
        assert_eq!(vault.writes.load(Ordering::SeqCst), 1);

        first
            .insert_user("alice".to_string(), "x".to_string())
            .await
            .unwrap();
        let found = second.find_user("alice".to_string()).await.unwrap();
        assert!(found.is_some());
        let again = cell.get().unwrap();
        assert!(again.find_user("alice".to_string()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_initialize_can_be_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vitals.db.age");
        let original = key();
        StoreHandle::open(&StoreConfig::file(&path), original.clone())
            .unwrap()
            .close()
            .await
            .unwrap();

        let keys = KeyManager::new(Arc::new(MemoryVault::new()));
        let cell = StoreCell::new(StoreConfig::file(&path));
        let err = cell.initialize(&keys).unwrap_err();
        assert!(matches!(err, VitalsError::IncorrectKey));
        assert!(!cell.is_initialized());
        assert!(matches!(cell.get(), Err(VitalsError::StoreNotInitialized)));

        keys.persist_key(&original).unwrap();
        let handle = cell.initialize(&keys).unwrap();
        assert!(cell.is_initialized());
        handle.check_integrity().await.unwrap();
    }

    #[test]
    fn test_owned_data_rejects_empty_payload() {
        assert!(owned_data_from_bytes(&[]).is_err());
    }
}
