//! Fixed-pattern map caching.
//!
//! Keeps one set of maps per render resolution and seed so that changing a
//! slider or stepping through a sequence never regenerates the sensor defects.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::Result;
use crate::sensor::fixed_pattern::{FixedPatternMaps, generate_fixed_pattern_maps};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapKey {
    pub width: u32,
    pub height: u32,
    pub seed: u64,
}

/// Shared, read-mostly store of immutable map sets.
///
/// Two threads missing the same key at once both generate it and the later
/// insert wins. The values are identical for identical keys, so this race is
/// tolerated rather than serialized behind the write lock.
#[derive(Debug, Default)]
pub struct FixedPatternCache {
    entries: RwLock<HashMap<MapKey, Arc<FixedPatternMaps>>>,
}

impl FixedPatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the maps for `(width, height, seed)`, generating them on a miss.
    pub fn get_or_generate(&self, width: u32, height: u32, seed: u64) -> Result<Arc<FixedPatternMaps>> {
        let key = MapKey {
            width,
            height,
            seed,
        };
        if let Some(maps) = self.lookup(&key) {
            log::debug!("Fixed-pattern cache hit for {width}x{height}");
            return Ok(maps);
        }

        let maps = Arc::new(generate_fixed_pattern_maps(width, height, seed)?);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&maps));
        Ok(maps)
    }

    pub fn lookup(&self, key: &MapKey) -> Option<Arc<FixedPatternMaps>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Drop every cached map set, forcing regeneration on next use.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !entries.is_empty() {
            log::debug!("Invalidating {} fixed-pattern map set(s)", entries.len());
        }
        entries.clear();
    }

    /// Drop every entry whose key is not in `keep`. Returns how many were evicted.
    pub fn retain_only(&self, keep: &[MapKey]) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|key, _| keep.contains(key));
        let evicted = before - entries.len();
        if evicted > 0 {
            log::debug!("Evicted {evicted} stale fixed-pattern map set(s)");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One-line description of the cache contents.
    pub fn summary(&self) -> String {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        if entries.is_empty() {
            return "No fixed-pattern maps".to_string();
        }
        let mut keys: Vec<String> = entries
            .keys()
            .map(|k| format!("{}x{}#{}", k.width, k.height, k.seed))
            .collect();
        keys.sort();
        format!("{} map set(s): {}", entries.len(), keys.join(", "))
    }
}
