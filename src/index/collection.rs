use super::kv::KvStore;
use crate::error::Error;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use tracing::trace;

/// How `upsert` grows an existing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendPolicy {
    /// Add the value only if an equal one is not already recorded.
    AppendIfAbsent,
    /// Every call records the value.
    AlwaysAppend,
}

/// A named key → JSON array collection over a [`KvStore`]. Sequences only
/// ever grow.
pub struct Collection<V> {
    name: &'static str,
    store: Box<dyn KvStore>,
    policy: AppendPolicy,
    _value: PhantomData<V>,
}

impl<V> Collection<V>
where
    V: Serialize + DeserializeOwned + PartialEq,
{
    pub fn new(name: &'static str, store: Box<dyn KvStore>, policy: AppendPolicy) -> Self {
        Self {
            name,
            store,
            policy,
            _value: PhantomData,
        }
    }

    pub fn lookup(&self, key: &str) -> Result<Option<Vec<V>>, Error> {
        match self.store.get(key.as_bytes())? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    /// Read the current sequence, let `update_fn` produce the new one and
    /// persist it before returning it.
    pub fn update<F>(&self, key: &str, update_fn: F) -> Result<Vec<V>, Error>
    where
        F: FnOnce(Option<Vec<V>>) -> Vec<V>,
    {
        let current = self.lookup(key)?;
        let updated = update_fn(current);
        let raw = serde_json::to_vec(&updated)?;
        self.store.put(key.as_bytes(), &raw)?;
        trace!("{}[{}] now holds {} values", self.name, key, updated.len());
        Ok(updated)
    }

    /// Singleton on first sight, otherwise append according to the policy.
    pub fn upsert(&self, key: &str, value: V) -> Result<Vec<V>, Error> {
        let policy = self.policy;
        self.update(key, move |current| match current {
            None => vec![value],
            Some(mut values) => {
                if policy == AppendPolicy::AlwaysAppend || !values.contains(&value) {
                    values.push(value);
                }
                values
            }
        })
    }

    pub fn entries(&self) -> Result<Vec<(String, Vec<V>)>, Error> {
        self.store
            .entries()?
            .into_iter()
            .map(|(key, raw)| {
                let values = serde_json::from_slice(&raw)?;
                Ok((String::from_utf8_lossy(&key).into_owned(), values))
            })
            .collect()
    }

    pub fn len(&self) -> Result<usize, Error> {
        self.store.count()
    }

    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len()? == 0)
    }

    pub fn flush(&self) -> Result<(), Error> {
        self.store.flush()
    }
}
