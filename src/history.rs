//! Bounded view history.
//!
//! Remembers snapshots of the most recently viewed items, oldest first.
//! Viewing an item again moves it to the newest position instead of adding a
//! duplicate; when a new id would exceed the limit the oldest entry is
//! evicted.
//!
//! Nodes live in a `Vec` arena and are chained through `prev`/`next` slot
//! indices, with an id -> slot index on the side. Promotion and removal are
//! link surgery plus a `swap_remove` on the arena, so `record` and `forget`
//! never scan or shift entries.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::issue::{Item, ItemId};

/// Default number of distinct items remembered.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone)]
struct Node {
    id: ItemId,
    snapshot: Item,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct HistoryCache {
    limit: usize,
    nodes: Vec<Node>,
    index: HashMap<ItemId, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl Default for HistoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryCache {
    /// Create a cache remembering at most `limit` items. A limit of zero
    /// remembers nothing.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            nodes: Vec::with_capacity(limit),
            index: HashMap::with_capacity(limit),
            head: None,
            tail: None,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.index.contains_key(&id)
    }

    /// Insert or promote `snapshot` to the most recent position.
    pub fn record(&mut self, snapshot: Item) -> Result<()> {
        let id = snapshot.id().ok_or_else(|| {
            Error::InvalidArgument("cannot record history for an item without an id".to_string())
        })?;
        if self.limit == 0 {
            return Ok(());
        }

        if let Some(&slot) = self.index.get(&id) {
            self.nodes[slot].snapshot = snapshot;
            if self.tail != Some(slot) {
                self.unlink(slot);
                self.link_last(slot);
            }
            return Ok(());
        }

        if self.nodes.len() >= self.limit {
            if let Some(oldest) = self.head {
                self.remove_slot(oldest);
            }
        }

        let slot = self.nodes.len();
        self.nodes.push(Node {
            id,
            snapshot,
            prev: None,
            next: None,
        });
        self.index.insert(id, slot);
        self.link_last(slot);
        Ok(())
    }

    /// Drop the entry for `id`. Returns whether anything was removed.
    pub fn forget(&mut self, id: ItemId) -> bool {
        match self.index.get(&id).copied() {
            Some(slot) => {
                self.remove_slot(slot);
                true
            }
            None => false,
        }
    }

    /// Snapshots from least to most recently viewed.
    pub fn list(&self) -> Vec<Item> {
        self.iter().cloned().collect()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            cache: self,
            cursor: self.head,
            remaining: self.nodes.len(),
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    fn unlink(&mut self, slot: usize) {
        let prev = self.nodes[slot].prev.take();
        let next = self.nodes[slot].next.take();
        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }
    }

    fn link_last(&mut self, slot: usize) {
        self.nodes[slot].prev = self.tail;
        self.nodes[slot].next = None;
        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
    }

    fn remove_slot(&mut self, slot: usize) {
        self.unlink(slot);
        let removed = self.nodes.swap_remove(slot);
        self.index.remove(&removed.id);

        // The former last node now occupies `slot`; repoint its neighbours.
        if slot < self.nodes.len() {
            let moved = &self.nodes[slot];
            let (id, prev, next) = (moved.id, moved.prev, moved.next);
            match prev {
                Some(prev) => self.nodes[prev].next = Some(slot),
                None => self.head = Some(slot),
            }
            match next {
                Some(next) => self.nodes[next].prev = Some(slot),
                None => self.tail = Some(slot),
            }
            self.index.insert(id, slot);
        }
    }
}

/// Oldest-to-newest iterator over remembered snapshots.
pub struct Iter<'a> {
    cache: &'a HistoryCache,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Item;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let node = &self.cache.nodes[slot];
        self.cursor = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(&node.snapshot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}
