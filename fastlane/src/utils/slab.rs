use std::mem::MaybeUninit;

/// Stable handle to a value stored in a [`Slab`].
///
/// A handle pairs a slot index with the generation the slot had when the
/// value was inserted. Once the value is removed the slot's generation moves
/// on, so a stale handle never aliases a later occupant of the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SlotId {
    index: usize,
    generation: u32,
}

impl SlotId {
    /// Returns the raw slot index.
    pub(crate) fn index(&self) -> usize {
        self.index
    }
}

/// A simple generational slab allocator.
///
/// A `Slab` stores values of type `T` in a contiguous array and hands out
/// [`SlotId`]s that stay valid until the value is removed. Freed slots are
/// reused.
///
/// Internally, it keeps track of:
/// - initialized slots,
/// - free indices,
/// - the generation of every slot,
/// - and uninitialized memory using [`MaybeUninit`].
///
/// All lookups are checked: asking for a removed or stale id yields `None`.
pub(crate) struct Slab<T> {
    /// Storage for items (may contain uninitialized slots).
    items: Vec<MaybeUninit<T>>,
    /// Stack of free indices that can be reused.
    free: Vec<usize>,
    /// Marks whether a slot is currently initialized.
    used: Vec<bool>,
    /// Generation of each slot, bumped on every removal.
    generations: Vec<u32>,
    /// Number of initialized slots.
    len: usize,
}

impl<T> Slab<T> {
    /// Creates a new `Slab` with a fixed initial capacity.
    ///
    /// All slots are initially free and uninitialized.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let slab = Slab::<i32>::new(16);
    /// ```
    pub(crate) fn new(size: usize) -> Self {
        let items = (0..size).map(|_| MaybeUninit::<T>::uninit()).collect();
        // Reversed so that `pop` hands out the lowest index first.
        let free = (0..size).rev().collect();
        let used = vec![false; size];
        let generations = vec![0; size];

        Self {
            items,
            free,
            used,
            generations,
            len: 0,
        }
    }

    /// Number of values currently stored.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no value is stored.
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a value into the slab and returns its id.
    ///
    /// If a free slot is available, it is reused.
    /// Otherwise, the slab grows exponentially.
    pub(crate) fn insert(&mut self, item: T) -> SlotId {
        self.insert_with(|_| item)
    }

    /// Inserts the value built by `make`, which receives the id the value
    /// will be stored under.
    ///
    /// Useful for values that need to know their own handle.
    pub(crate) fn insert_with(&mut self, make: impl FnOnce(SlotId) -> T) -> SlotId {
        let index = match self.free.pop() {
            Some(i) => i,
            None => {
                let len = self.items.len();
                let new_len = if len == 0 { 1 } else { 2 * len };

                self.items
                    .extend((len..new_len).map(|_| MaybeUninit::<T>::uninit()));
                self.free.extend(((len + 1)..new_len).rev());
                self.used.resize(new_len, false);
                self.generations.resize(new_len, 0);

                len
            }
        };

        let id = SlotId {
            index,
            generation: self.generations[index],
        };

        self.items[index] = MaybeUninit::new(make(id));
        self.used[index] = true;
        self.len += 1;

        id
    }

    /// Returns `true` if `id` refers to a value that is still stored.
    pub(crate) fn contains(&self, id: SlotId) -> bool {
        id.index < self.items.len()
            && self.used[id.index]
            && self.generations[id.index] == id.generation
    }

    /// Removes and returns the value stored under `id`.
    ///
    /// Returns `None` if the id is stale. The slot becomes free and may be
    /// reused by future insertions, under a new generation.
    pub(crate) fn remove(&mut self, id: SlotId) -> Option<T> {
        if !self.contains(id) {
            return None;
        }

        self.free.push(id.index);
        self.used[id.index] = false;
        self.generations[id.index] = self.generations[id.index].wrapping_add(1);
        self.len -= 1;

        // SAFETY: `contains` checked that the slot is initialized, and it is
        // marked unused before anything can observe it again.
        let item = unsafe { self.items[id.index].assume_init_read() };
        self.items[id.index] = MaybeUninit::uninit();

        Some(item)
    }

    /// Returns a shared reference to the value stored under `id`.
    pub(crate) fn get(&self, id: SlotId) -> Option<&T> {
        if !self.contains(id) {
            return None;
        }

        // SAFETY: `contains` checked that the slot is initialized.
        Some(unsafe { self.items[id.index].assume_init_ref() })
    }

    /// Returns a mutable reference to the value stored under `id`.
    pub(crate) fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        if !self.contains(id) {
            return None;
        }

        // SAFETY: `contains` checked that the slot is initialized.
        Some(unsafe { self.items[id.index].assume_init_mut() })
    }
}

impl<T> Drop for Slab<T> {
    /// Drops all initialized elements stored in the slab.
    ///
    /// Uninitialized slots are ignored.
    fn drop(&mut self) {
        for (slot, &used) in self.items.iter_mut().zip(self.used.iter()) {
            if used {
                unsafe {
                    slot.assume_init_drop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::rc::Rc;

    #[test]
    fn insert_then_get() {
        let mut slab = Slab::new(2);
        let a = slab.insert("a");
        let b = slab.insert("b");

        assert_eq!(slab.get(a), Some(&"a"));
        assert_eq!(slab.get(b), Some(&"b"));
        assert_eq!(slab.len(), 2);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut slab = Slab::new(0);
        let ids: Vec<_> = (0..10).map(|i| slab.insert(i)).collect();

        for (i, id) in ids.iter().enumerate() {
            assert_eq!(slab.get(*id), Some(&i));
        }
        assert_eq!(slab.len(), 10);
    }

    #[test]
    fn stale_id_does_not_alias_reused_slot() {
        let mut slab = Slab::new(1);
        let first = slab.insert(1);
        assert_eq!(slab.remove(first), Some(1));

        let second = slab.insert(2);
        assert_eq!(first.index(), second.index());
        assert_eq!(slab.get(first), None);
        assert_eq!(slab.remove(first), None);
        assert_eq!(slab.get(second), Some(&2));
    }

    #[test]
    fn insert_with_sees_own_id() {
        let mut slab = Slab::new(4);
        let id = slab.insert_with(|id| id);

        assert_eq!(slab.get(id), Some(&id));
    }

    #[test]
    fn drop_releases_live_values() {
        let marker = Rc::new(());
        {
            let mut slab = Slab::new(4);
            let a = slab.insert(marker.clone());
            slab.insert(marker.clone());
            slab.remove(a);
            assert_eq!(Rc::strong_count(&marker), 2);
        }
        assert_eq!(Rc::strong_count(&marker), 1);
    }
}
