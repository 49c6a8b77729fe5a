//! Object Pool
//!
//! Fixed-capacity reusable-instance allocator backing every limited
//! per-frame resource (cameras, lights, animation players).
//!
//! # Design
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │                  ObjectPool<T>                     │
//! │                                                    │
//! │  entries: [active ... | inactive ...]              │
//! │            0        ^active_count                  │
//! │                                                    │
//! │  fetch()   → PoolHandle   (activates an instance)  │
//! │  release() → swap-remove against active_count      │
//! │  iter_active() walks the contiguous prefix         │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! Releasing swaps the released entry with the last active one, so the
//! active set is always the contiguous prefix `[0, active_count)` and
//! per-frame iteration never allocates. The flip side is that an entry's
//! *index* is unstable across `release` calls — which is why the public
//! API only ever hands out opaque [`PoolHandle`]s, never indices.
//!
//! Instances are pre-constructed up front and reused; when the pool is
//! exhausted, capacity doubles.

use rustc_hash::FxHashMap;

/// Opaque handle to a pooled instance.
///
/// Stays valid until the instance is released, regardless of how the
/// pool compacts its backing storage internally. The generation ties the
/// handle to one activation: once released, the handle never resolves
/// again, even after the instance is fetched for its next life.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PoolHandle {
    id: u32,
    generation: u32,
}

struct Entry<T> {
    id: u32,
    /// Bumped on release; stale handles carry the old value.
    generation: u32,
    value: T,
}

/// A pool of reusable `T` instances with an always-contiguous active set.
pub struct ObjectPool<T> {
    entries: Vec<Entry<T>>,
    /// Entries `[0, active_count)` are active; the rest are free.
    active_count: usize,
    /// Handle id → current slot index. Maintained across swap-compaction.
    slots: FxHashMap<u32, usize>,
    next_id: u32,
    label: &'static str,
}

impl<T: Default> ObjectPool<T> {
    /// Creates a pool with `capacity` pre-constructed inactive instances.
    #[must_use]
    pub fn new(label: &'static str, capacity: usize) -> Self {
        let mut entries = Vec::with_capacity(capacity);
        let mut next_id = 0;
        for _ in 0..capacity {
            entries.push(Entry {
                id: next_id,
                generation: 0,
                value: T::default(),
            });
            next_id += 1;
        }
        Self {
            entries,
            active_count: 0,
            slots: FxHashMap::default(),
            next_id,
            label,
        }
    }

    /// Activates an inactive instance and returns its handle.
    ///
    /// Doubles capacity when every instance is already active.
    pub fn fetch(&mut self) -> PoolHandle {
        if self.active_count == self.entries.len() {
            let new_capacity = (self.entries.len() * 2).max(1);
            log::info!(
                "ObjectPool '{}' expanding capacity: {} -> {}",
                self.label,
                self.entries.len(),
                new_capacity
            );
            while self.entries.len() < new_capacity {
                self.entries.push(Entry {
                    id: self.next_id,
                    generation: 0,
                    value: T::default(),
                });
                self.next_id += 1;
            }
        }

        let index = self.active_count;
        let entry = &self.entries[index];
        let handle = PoolHandle {
            id: entry.id,
            generation: entry.generation,
        };
        self.slots.insert(entry.id, index);
        self.active_count += 1;
        handle
    }

    /// Deactivates an instance, returning it to the free partition.
    ///
    /// The instance value is left as-is; callers that need a clean slate
    /// reset it on the next `fetch`. Returns `false` if the handle was
    /// already released.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        let Some(&index) = self.slots.get(&handle.id) else {
            return false;
        };
        if self.entries[index].generation != handle.generation {
            return false;
        }
        self.slots.remove(&handle.id);

        let last = self.active_count - 1;
        if index != last {
            self.entries.swap(index, last);
            // The entry that moved into `index` is still active; re-point
            // its handle.
            let moved_id = self.entries[index].id;
            self.slots.insert(moved_id, index);
        }
        // Invalidate every outstanding handle to the released instance.
        self.entries[last].generation = self.entries[last].generation.wrapping_add(1);
        self.active_count = last;
        true
    }

    /// Looks up an active instance by handle.
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        let &index = self.slots.get(&handle.id)?;
        let entry = &self.entries[index];
        (entry.generation == handle.generation).then_some(&entry.value)
    }

    /// Looks up an active instance mutably by handle.
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        let &index = self.slots.get(&handle.id)?;
        let entry = &mut self.entries[index];
        (entry.generation == handle.generation).then_some(&mut entry.value)
    }

    /// `true` while the handle refers to an active instance.
    #[must_use]
    pub fn is_active(&self, handle: PoolHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of currently active instances.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Total capacity (active + free).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Iterates every active instance, in internal (unordered) slot order.
    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.entries[..self.active_count].iter().map(|e| {
            (
                PoolHandle {
                    id: e.id,
                    generation: e.generation,
                },
                &e.value,
            )
        })
    }

    /// Mutable variant of [`iter_active`](Self::iter_active).
    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = (PoolHandle, &mut T)> {
        self.entries[..self.active_count].iter_mut().map(|e| {
            (
                PoolHandle {
                    id: e.id,
                    generation: e.generation,
                },
                &mut e.value,
            )
        })
    }
}
