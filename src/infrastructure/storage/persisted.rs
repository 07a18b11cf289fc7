use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use super::memory::{MemoryStore, Snapshot};
use crate::application::errors::StorageError;
use crate::domain::entities::{Guild, User, Value};
use crate::domain::traits::Storage;

/// Writable target for full-state snapshots: truncate, seek to start,
/// write, sync.
pub trait SnapshotSink: Write + Seek + Send {
    fn truncate(&mut self) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl SnapshotSink for File {
    fn truncate(&mut self) -> io::Result<()> {
        self.set_len(0)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

impl SnapshotSink for Cursor<Vec<u8>> {
    fn truncate(&mut self) -> io::Result<()> {
        self.get_mut().clear();
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Store that flushes a JSON snapshot after every mutation
///
/// The in-memory state is authoritative: a failed flush is returned to the
/// caller but the mutation is kept. The sink lock is held across
/// mutate + serialize + write so snapshots land in mutation order.
pub struct PersistedStore<S: SnapshotSink> {
    inner: MemoryStore,
    sink: Mutex<S>,
}

impl PersistedStore<File> {
    /// Open (or create) a snapshot file and load its contents once
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let mut content = String::new();
        file.read_to_string(&mut content)?;
        let snapshot = if content.trim().is_empty() {
            Snapshot::default()
        } else {
            serde_json::from_str(&content)?
        };
        tracing::info!(
            "Loaded store snapshot from {} ({} guild services, {} user services)",
            path.display(),
            snapshot.guilds.len(),
            snapshot.users.len()
        );
        Ok(Self::new(file, snapshot))
    }
}

impl<S: SnapshotSink> PersistedStore<S> {
    pub fn new(sink: S, snapshot: Snapshot) -> Self {
        Self {
            inner: MemoryStore::from_snapshot(snapshot),
            sink: Mutex::new(sink),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.snapshot()
    }

    pub fn into_sink(self) -> S {
        self.sink.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&MemoryStore) -> Result<(), StorageError>,
    {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        f(&self.inner)?;
        self.flush(&mut *sink)
    }

    fn flush(&self, sink: &mut S) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(&self.inner.snapshot())?;
        sink.truncate()?;
        sink.seek(SeekFrom::Start(0))?;
        sink.write_all(&bytes)?;
        sink.flush()?;
        sink.sync()?;
        tracing::debug!("Flushed store snapshot ({} bytes)", bytes.len());
        Ok(())
    }
}

impl<S: SnapshotSink> Storage for PersistedStore<S> {
    fn get_guild_value(&self, guild: &Guild, key: &str) -> Option<Value> {
        self.inner.get_guild_value(guild, key)
    }

    fn set_guild_value(&self, guild: &Guild, key: &str, value: Value) -> Result<(), StorageError> {
        self.mutate(|store| store.set_guild_value(guild, key, value))
    }

    fn set_default_guild_value(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.mutate(|store| store.set_default_guild_value(key, value))
    }

    fn get_user_value(&self, user: &User, key: &str) -> Option<Value> {
        self.inner.get_user_value(user, key)
    }

    fn set_user_value(&self, user: &User, key: &str, value: Value) -> Result<(), StorageError> {
        self.mutate(|store| store.set_user_value(user, key, value))
    }

    fn set_default_user_value(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.mutate(|store| store.set_default_user_value(key, value))
    }

    fn get_global_value(&self, key: &str) -> Option<Value> {
        self.inner.get_global_value(key)
    }

    fn set_global_value(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.mutate(|store| store.set_global_value(key, value))
    }

    fn is_admin(&self, guild: &Guild, id: &str) -> Result<bool, StorageError> {
        self.inner.is_admin(guild, id)
    }

    fn set_admin(&self, guild: &Guild, id: &str) -> Result<(), StorageError> {
        self.mutate(|store| store.set_admin(guild, id))
    }

    fn unset_admin(&self, guild: &Guild, id: &str) -> Result<(), StorageError> {
        self.mutate(|store| store.unset_admin(guild, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink whose writes always fail
    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for BrokenSink {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Ok(0)
        }
    }

    impl SnapshotSink for BrokenSink {
        fn truncate(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn sync(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn written(store: PersistedStore<Cursor<Vec<u8>>>) -> Snapshot {
        let bytes = store.into_sink().into_inner();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_every_mutation_flushes_full_state() {
        let store = PersistedStore::new(Cursor::new(Vec::new()), Snapshot::default());
        let guild = Guild::new("discord", "g1");
        let user = User::new("discord", "alice");

        store.set_default_guild_value("prefix", Value::from("!")).unwrap();
        store.set_guild_value(&guild, "prefix", Value::from("?")).unwrap();
        store.set_user_value(&user, "lang", Value::from("en")).unwrap();
        store.set_admin(&guild, "alice").unwrap();

        let expected = store.snapshot();
        assert_eq!(written(store), expected);
    }

    #[test]
    fn test_reload_is_equivalent() {
        let store = PersistedStore::new(Cursor::new(Vec::new()), Snapshot::default());
        let guild = Guild::new("discord", "g1");
        store.set_admin(&guild, "u1").unwrap();
        store.set_global_value("hits", Value::Timestamps(vec![10, 20])).unwrap();

        let reloaded = MemoryStore::from_snapshot(written(store));
        assert!(reloaded.is_admin(&guild, "u1").unwrap());
        assert_eq!(
            reloaded.get_global_value("hits"),
            Some(Value::Timestamps(vec![10, 20]))
        );
    }

    #[test]
    fn test_shorter_snapshot_overwrites_longer() {
        let store = PersistedStore::new(Cursor::new(Vec::new()), Snapshot::default());
        let guild = Guild::new("discord", "g1");
        store.set_guild_value(&guild, "note", Value::from("x".repeat(200))).unwrap();
        store.set_guild_value(&guild, "note", Value::from("y")).unwrap();

        let snapshot = written(store);
        assert_eq!(snapshot.guilds["discord"]["g1"]["note"], Value::from("y"));
    }

    #[test]
    fn test_flush_failure_keeps_memory_state() {
        let store = PersistedStore::new(BrokenSink, Snapshot::default());
        let guild = Guild::new("discord", "g1");

        let err = store.set_admin(&guild, "u1").unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert!(store.is_admin(&guild, "u1").unwrap());
    }

    #[test]
    fn test_corruption_is_not_flushed() {
        let store = PersistedStore::new(BrokenSink, Snapshot::default());
        let guild = Guild::new("discord", "g1");
        let _ = store.set_guild_value(&guild, "Admin", Value::Integer(3));

        let err = store.set_admin(&guild, "u1").unwrap_err();
        assert!(err.is_corruption());
    }
}
