//! Identifier allocation.
//!
//! The allocator is a plain counter owned by whoever owns the item store.
//! There is no process-wide state; two managers never share ids unless they
//! are handed the same allocator.

use crate::error::{Error, Result};
use crate::issue::ItemId;

const FIRST_ID: u64 = 1;

/// Strictly increasing id source. Never hands out 0 or anything past
/// [`ItemId::MAX`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: FIRST_ID }
    }

    /// Start handing out ids from `first`.
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Next id that would be handed out.
    pub fn peek(&self) -> ItemId {
        ItemId::new(self.next)
    }

    /// Hand out the next id, skipping any that `in_use` reports as taken.
    pub fn allocate(&mut self, in_use: impl Fn(ItemId) -> bool) -> Result<ItemId> {
        loop {
            if self.next == 0 || self.next > ItemId::MAX.get() {
                return Err(Error::OperationFailed(format!(
                    "item id space exhausted at {}",
                    self.next
                )));
            }
            let candidate = ItemId::new(self.next);
            // next <= MAX < u64::MAX here
            self.next += 1;
            if !in_use(candidate) {
                return Ok(candidate);
            }
        }
    }

    /// Make sure `id` is never handed out again.
    pub fn observe(&mut self, id: ItemId) -> Result<()> {
        let value = ItemId::checked(id.get())?.get();
        if value >= self.next {
            self.next = value + 1;
        }
        Ok(())
    }

    /// Test support: rewind to the first id.
    pub fn reset(&mut self) {
        self.next = FIRST_ID;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_increasing_ids_from_one() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.allocate(|_| false).expect("id"), ItemId::new(1));
        assert_eq!(ids.allocate(|_| false).expect("id"), ItemId::new(2));
        assert_eq!(ids.peek(), ItemId::new(3));
    }

    #[test]
    fn skips_ids_in_use() {
        let mut ids = IdAllocator::new();
        let taken = [ItemId::new(1), ItemId::new(2)];
        assert_eq!(
            ids.allocate(|id| taken.contains(&id)).expect("id"),
            ItemId::new(3)
        );
    }

    #[test]
    fn observe_moves_past_loaded_ids() {
        let mut ids = IdAllocator::new();
        ids.observe(ItemId::new(41)).expect("observe");
        ids.observe(ItemId::new(7)).expect("observe");
        assert_eq!(ids.allocate(|_| false).expect("id"), ItemId::new(42));
    }

    #[test]
    fn largest_id_is_handed_out_once() {
        let mut ids = IdAllocator::new();
        ids.observe(ItemId::new(ItemId::MAX.get() - 1)).expect("observe");
        assert_eq!(ids.allocate(|_| false).expect("last id"), ItemId::MAX);
        assert!(matches!(
            ids.allocate(|_| false),
            Err(Error::OperationFailed(_))
        ));
        assert_eq!(ids.peek().get(), u64::MAX);
    }

    #[test]
    fn observe_rejects_ids_out_of_range() {
        let mut ids = IdAllocator::new();
        assert!(ids.observe(ItemId::new(u64::MAX)).is_err());
        assert!(ids.observe(ItemId::new(0)).is_err());
        assert_eq!(ids.peek(), ItemId::new(1));
    }

    #[test]
    fn exhausted_start_never_wraps() {
        let mut ids = IdAllocator::starting_at(u64::MAX);
        assert!(ids.allocate(|_| false).is_err());
        let mut ids = IdAllocator::starting_at(0);
        assert!(ids.allocate(|_| false).is_err());
    }

    #[test]
    fn reset_rewinds() {
        let mut ids = IdAllocator::starting_at(10);
        ids.allocate(|_| false).expect("id");
        ids.reset();
        assert_eq!(ids.peek(), ItemId::new(1));
    }
}
