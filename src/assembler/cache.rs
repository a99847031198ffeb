use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::assets::AssetId;
use crate::raster::Raster;
use crate::transform::ParamsKey;

/// Identity of one resolved raster: which asset, which of its source frames,
/// and every parameter that affects pixels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub asset: AssetId,
    pub frame: usize,
    pub params: ParamsKey,
}

/// Bounded memo of transformed, canvas-fitted rasters.
///
/// Evicts in insertion order once `capacity` entries are held. A miss is
/// always answered by recomputation, so eviction never affects output.
#[derive(Debug)]
pub struct RasterCache {
    capacity: usize,
    entries: HashMap<CacheKey, Arc<Raster>>,
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

impl RasterCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<Raster>> {
        match self.entries.get(key) {
            Some(raster) => {
                self.hits += 1;
                Some(Arc::clone(raster))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: CacheKey, raster: Arc<Raster>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key.clone(), raster).is_some() {
            return;
        }
        self.order.push_back(key);

        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
