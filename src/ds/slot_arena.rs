//! Pooled slot storage addressed by stable integer handles.
//!
//! Every cache keeps its entries in a `SlotArena` instead of boxing them one
//! by one. Removing an entry returns its slot to a free list, and the next
//! insert takes the most recently freed slot, so a cache that churns through
//! put/evict cycles at a steady size stops allocating once it is warm.
//!
//! ```text
//!   slots:     [ Some(a) | None | Some(c) | None ]
//!   free_list: [ 3, 1 ]            ← next insert lands in slot 1
//! ```
//!
//! `SlotId`s are only meaningful for the arena that issued them. A freed id
//! may be handed out again, so owners must drop every copy of an id when the
//! value is removed.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub(crate) usize);

impl SlotId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
pub struct SlotArena<T> {
    slots: Vec<Option<T>>,
    free_list: Vec<usize>,
    len: usize,
    reused: u64,
}

impl<T> SlotArena<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
            reused: 0,
        }
    }

    /// Stores `value`, preferring a previously freed slot.
    pub fn insert(&mut self, value: T) -> SlotId {
        let idx = match self.free_list.pop() {
            Some(idx) => {
                self.slots[idx] = Some(value);
                self.reused += 1;
                idx
            },
            None => {
                self.slots.push(Some(value));
                self.slots.len() - 1
            },
        };
        self.len += 1;
        SlotId(idx)
    }

    /// Takes the value out of `id` and puts the slot back in the pool.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let value = self.slots.get_mut(id.0)?.take()?;
        self.free_list.push(id.0);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// How many inserts were served from the free list.
    pub fn reused(&self) -> u64 {
        self.reused
    }

    /// Frees every slot while keeping the backing allocation for reuse.
    pub fn clear(&mut self) {
        self.free_list.clear();
        for (idx, slot) in self.slots.iter_mut().enumerate().rev() {
            *slot = None;
            self.free_list.push(idx);
        }
        self.len = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|value| (SlotId(idx), value)))
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_remove_reuses_freed_slot() {
        let mut arena = SlotArena::new();
        let id1 = arena.insert("a");
        let id2 = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(id1), Some(&"a"));
        assert_eq!(arena.get(id2), Some(&"b"));

        assert_eq!(arena.remove(id1), Some("a"));
        assert_eq!(arena.len(), 1);
        assert!(!arena.contains(id1));

        let id3 = arena.insert("c");
        assert_eq!(id1.index(), id3.index());
        assert_eq!(arena.get(id3), Some(&"c"));
        assert_eq!(arena.reused(), 1);
    }

    #[test]
    fn double_remove_is_noop() {
        let mut arena = SlotArena::new();
        let id = arena.insert(1);
        assert_eq!(arena.remove(id), Some(1));
        assert_eq!(arena.remove(id), None);
        assert!(arena.is_empty());
    }

    #[test]
    fn clear_keeps_slots_pooled() {
        let mut arena = SlotArena::with_capacity(4);
        for i in 0..4 {
            arena.insert(i);
        }
        arena.clear();
        assert!(arena.is_empty());

        let id = arena.insert(9);
        assert_eq!(id.index(), 0);
        assert_eq!(arena.reused(), 1);
    }

    #[test]
    fn steady_churn_stops_allocating() {
        let mut arena = SlotArena::new();
        let mut live: Vec<SlotId> = (0..8).map(|i| arena.insert(i)).collect();
        for round in 0..100 {
            let id = live.remove(0);
            arena.remove(id);
            live.push(arena.insert(round));
        }
        assert_eq!(arena.reused(), 100);
        assert!(live.iter().all(|id| id.index() < 8));
        assert_eq!(arena.len(), 8);
    }

    #[test]
    fn iter_skips_free_slots() {
        let mut arena = SlotArena::new();
        let a = arena.insert('a');
        let b = arena.insert('b');
        arena.remove(a);
        let items: Vec<_> = arena.iter().map(|(id, v)| (id, *v)).collect();
        assert_eq!(items, vec![(b, 'b')]);
    }
}
