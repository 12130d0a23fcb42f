//! Time-boxed memo in front of a store

use super::{Revision, Snapshot, TableStore};
use crate::error::Result;
use crate::table::Table;
use std::cell::RefCell;
use std::time::{Duration, Instant};
use tracing::debug;

/// Serves repeated loads from memory until `ttl` expires.
/// A successful write always drops the memo.
pub struct CachedStore<S> {
    inner: S,
    ttl: Duration,
    cached: RefCell<Option<(Instant, Snapshot)>>,
}

impl<S: TableStore> CachedStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: RefCell::new(None),
        }
    }

    pub fn invalidate(&self) {
        self.cached.replace(None);
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: TableStore> TableStore for CachedStore<S> {
    fn load(&self) -> Result<Snapshot> {
        if let Some((at, snapshot)) = self.cached.borrow().as_ref() {
            if at.elapsed() < self.ttl {
                debug!("Serving {} from cache", self.inner.describe());
                return Ok(snapshot.clone());
            }
        }

        let snapshot = self.inner.load()?;
        if !self.ttl.is_zero() {
            self.cached.replace(Some((Instant::now(), snapshot.clone())));
        }
        Ok(snapshot)
    }

    fn replace_all(&self, table: &Table, base: Option<&Revision>) -> Result<Revision> {
        let result = self.inner.replace_all(table, base);
        if result.is_ok() {
            self.invalidate();
        }
        result
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}
