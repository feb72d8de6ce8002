//! Cache of rendered translations.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::{Error, Options, Result};

pub const DEFAULT_CAPACITY: usize = 64;

type Key = (String, Options);

/// Rendered Cypher by SQL text and options, evicted purely by recency.
///
/// Not synchronized: wrap it in a lock to share it between threads.
#[derive(Debug)]
pub struct TranslationCache {
    entries: LruCache<Key, String>,
}

impl TranslationCache {
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| Error::new_configuration("the cache size must be greater than 0"))?;
        Ok(TranslationCache {
            entries: LruCache::new(capacity),
        })
    }

    /// Returns the cached translation of `sql`, or runs `translate` and
    /// caches its result. Failed translations are not cached.
    pub fn get_or_try_insert_with<F>(&mut self, sql: &str, options: &Options, translate: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        let key = (sql.to_string(), options.clone());
        if let Some(cypher) = self.entries.get(&key) {
            log::trace!("cache hit for `{sql}`");
            return Ok(cypher.clone());
        }
        log::trace!("cache miss for `{sql}`");

        let cypher = translate()?;
        if let Some(((evicted, _), _)) = self.entries.push(key, cypher.clone()) {
            if evicted != sql {
                log::trace!("evicted `{evicted}` from the cache");
            }
        }
        Ok(cypher)
    }

    pub fn contains(&self, sql: &str, options: &Options) -> bool {
        self.entries.contains(&(sql.to_string(), options.clone()))
    }

    pub fn flush(&mut self) {
        log::trace!("flushing {} cached translations", self.entries.len());
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        TranslationCache {
            entries: LruCache::new(NonZeroUsize::MIN.saturating_add(DEFAULT_CAPACITY - 1)),
        }
    }
}
