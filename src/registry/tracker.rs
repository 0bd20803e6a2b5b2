use crate::id::{AssetGuid, AssetTypeId, CompositeKey};
use rustc_hash::FxHashMap;
use std::any::Any;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// One resident instance: the erased loaded object (an `Arc<K>` inside),
/// the liveness flag shared with every handle, and the owning kind.
pub(crate) struct LiveEntry {
    pub object: Box<dyn Any + Send + Sync>,
    pub flag: Arc<AtomicBool>,
    pub kind: AssetTypeId,
}

/// Which instances are resident in memory. Membership added on load,
/// removed on unload.
#[derive(Default)]
pub struct LiveSet {
    entries: FxHashMap<AssetGuid, LiveEntry>,
}

impl LiveSet {
    pub fn contains(&self, guid: AssetGuid) -> bool {
        self.entries.contains_key(&guid)
    }

    pub(crate) fn insert(&mut self, guid: AssetGuid, entry: LiveEntry) {
        self.entries.insert(guid, entry);
    }

    pub(crate) fn get(&self, guid: AssetGuid) -> Option<&LiveEntry> {
        self.entries.get(&guid)
    }

    pub(crate) fn remove(&mut self, guid: AssetGuid) -> Option<LiveEntry> {
        self.entries.remove(&guid)
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = (AssetGuid, LiveEntry)> + '_ {
        self.entries.drain()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared reference counters.
///
/// Keyed by the composite (kind, instance) key so two kinds whose
/// instances happen to share a numeric id never share a counter.
/// Entries are removed when they reach zero, so counts are never
/// negative.
#[derive(Default)]
pub struct RefCountTable {
    counts: FxHashMap<CompositeKey, u32>,
}

impl RefCountTable {
    /// Increment and return the new count.
    pub fn acquire(&mut self, key: CompositeKey) -> u32 {
        let count = self.counts.entry(key).or_insert(0);
        *count += 1;
        *count
    }

    /// Decrement and return the new count, or `None` for an unknown
    /// key (already released or never acquired).
    pub fn release(&mut self, key: CompositeKey) -> Option<u32> {
        let count = self.counts.get_mut(&key)?;
        *count -= 1;
        if *count == 0 {
            self.counts.remove(&key);
            Some(0)
        } else {
            Some(*count)
        }
    }

    pub fn count(&self, key: CompositeKey) -> u32 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    pub fn remove(&mut self, key: CompositeKey) -> Option<u32> {
        self.counts.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Registry counters in the cache-statistics style.
#[derive(Clone, Debug, Default)]
pub struct RegistryStats {
    pub imports: u64,
    pub loads: u64,
    pub unloads: u64,
    pub hits: u64,
    pub misses: u64,
}

impl RegistryStats {
    pub fn hit_ratio(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &[u8]) -> CompositeKey {
        CompositeKey::new(AssetTypeId::of_name("Texture"), AssetGuid::derive(name))
    }

    #[test]
    fn test_acquire_release_conservation() {
        let mut table = RefCountTable::default();
        let k = key(b"foo");

        assert_eq!(table.acquire(k), 1);
        assert_eq!(table.acquire(k), 2);
        assert_eq!(table.release(k), Some(1));
        assert_eq!(table.release(k), Some(0));
        assert_eq!(table.count(k), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_release_unknown_key() {
        let mut table = RefCountTable::default();
        assert_eq!(table.release(key(b"never")), None);
    }

    #[test]
    fn test_counts_are_per_composite_key() {
        let mut table = RefCountTable::default();
        let guid = AssetGuid::derive(b"shared");
        let a = CompositeKey::new(AssetTypeId::of_name("Texture"), guid);
        let b = CompositeKey::new(AssetTypeId::of_name("Audio"), guid);

        table.acquire(a);
        assert_eq!(table.count(a), 1);
        assert_eq!(table.count(b), 0);
    }

    #[test]
    fn test_hit_ratio() {
        let stats = RegistryStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((stats.hit_ratio() - 0.75).abs() < f32::EPSILON);
        assert_eq!(RegistryStats::default().hit_ratio(), 0.0);
    }
}
