use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::{Map, MapError};
use crate::geometry::{Geo, RectGeo};

type CacheKey = Vec<u64>;

fn cache_key(rect: &RectGeo) -> CacheKey {
    rect.lower_bounds
        .iter()
        .chain(&rect.upper_bounds)
        .map(|x| x.to_bits())
        .collect()
}

/// Memoizing wrapper keyed by the exact input box.
///
/// The cache belongs to this value and lives as long as it does. Interior
/// mutability makes it `!Sync`: share one `CachedMap` per thread, or wrap
/// the inner map separately for each worker.
#[derive(Debug)]
pub struct CachedMap<M> {
    inner: M,
    cache: RefCell<HashMap<CacheKey, Result<Geo, MapError>>>,
    hits: Cell<u64>,
}

impl<M: Map> CachedMap<M> {
    /// Wrap `inner` with an empty cache.
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
        }
    }

    /// Number of cached boxes.
    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    /// True when nothing is cached yet.
    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    /// Lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.get()
    }

    /// Drop every cached image.
    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }

    /// The wrapped map.
    pub fn into_inner(self) -> M {
        self.inner
    }
}

impl<M: Map> Map for CachedMap<M> {
    fn image(&self, rect: &RectGeo) -> Result<Geo, MapError> {
        let key = cache_key(rect);
        if let Some(image) = self.cache.borrow().get(&key) {
            self.hits.set(self.hits.get() + 1);
            return image.clone();
        }
        let image = self.inner.image(rect);
        self.cache.borrow_mut().insert(key, image.clone());
        image
    }

    fn good(&self) -> bool {
        self.inner.good()
    }
}
