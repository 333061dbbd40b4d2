use crate::error::Error;
use rocksdb::{IteratorMode, Options, DB};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Byte-keyed persistent map underneath each index collection.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error>;
    /// Must not return before the value would survive a process restart.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), Error>;
    fn entries(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>, Error>;
    fn flush(&self) -> Result<(), Error>;

    fn count(&self) -> Result<usize, Error> {
        Ok(self.entries()?.len())
    }
}

pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let mut db_options = Options::default();
        db_options.create_if_missing(true);
        let db = DB::open(&db_options, path)?;
        debug!("Opened index store at '{}'", path.display());
        Ok(Self { db })
    }
}

impl KvStore for RocksStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.db.get(key)?)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        Ok(self.db.put(key, value)?)
    }

    fn entries(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>, Error> {
        let mut entries = Vec::new();
        for item in self.db.iterator(IteratorMode::Start) {
            let (key, value) = item?;
            entries.push((key.to_vec(), value.to_vec()));
        }
        Ok(entries)
    }

    fn count(&self) -> Result<usize, Error> {
        let mut count = 0usize;
        for item in self.db.iterator(IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    fn flush(&self) -> Result<(), Error> {
        Ok(self.db.flush()?)
    }
}

/// Process-local store, ordered like RocksDB iteration.
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>>, Error> {
        self.map
            .lock()
            .map_err(|e| Error::Other(format!("Failed to lock memory store: {}", e)))
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        self.lock()?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>, Error> {
        Ok(self
            .lock()?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}
