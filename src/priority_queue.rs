use std::time::Instant;

/// Refers to an item inside a [PriorityQueue] for later priority updates. A handle becomes stale
///  when its item is extracted or the queue is cleared; stale handles are detected and never
///  refer to a different item.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ItemHandle {
    slot: usize,
    generation: u64,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriorityItem<V> {
    pub value: V,
    pub timestamp: Instant,
    pub priority: i64,
}

impl<V> PriorityItem<V> {
    /// Ordering key: higher priority first, and for equal priority the earlier timestamp first
    fn outranks(&self, other: &PriorityItem<V>) -> bool {
        if self.priority != other.priority {
            return self.priority > other.priority;
        }
        self.timestamp < other.timestamp
    }
}

struct Slot<V> {
    item: PriorityItem<V>,
    generation: u64,
    heap_index: usize,
}

/// A max-heap of items ordered by priority (descending), with ties broken by timestamp
///  (ascending). Items can be re-prioritized in place through the [ItemHandle] returned by
///  [PriorityQueue::insert].
///
/// Items are stored in slots that stay put while the heap (a vector of slot indices) is
///  reordered; each slot keeps track of where it currently is in the heap.
///
/// NB: There is no internal synchronization - sharing a queue between threads requires
///      external locking
pub struct PriorityQueue<V> {
    slots: Vec<Option<Slot<V>>>,
    free_slots: Vec<usize>,
    heap: Vec<usize>,
    next_generation: u64,
}

impl<V> Default for PriorityQueue<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PriorityQueue<V> {
    pub fn new() -> PriorityQueue<V> {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> PriorityQueue<V> {
        PriorityQueue {
            slots: Vec::with_capacity(capacity),
            free_slots: Vec::new(),
            heap: Vec::with_capacity(capacity),
            next_generation: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn insert(&mut self, value: V, timestamp: Instant, priority: i64) -> ItemHandle {
        let generation = self.next_generation;
        self.next_generation += 1;

        let heap_index = self.heap.len();
        let slot = Slot {
            item: PriorityItem { value, timestamp, priority },
            generation,
            heap_index,
        };

        let slot_index = match self.free_slots.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                idx
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };

        self.heap.push(slot_index);
        self.sift_up(heap_index);

        ItemHandle {
            slot: slot_index,
            generation,
        }
    }

    pub fn peek_max(&self) -> Option<&PriorityItem<V>> {
        self.heap.first()
            .map(|&slot_index| &self.slot(slot_index).item)
    }

    /// Removes and returns the item with the highest priority.
    ///
    /// NB: The queue must not be empty - calling this on an empty queue is a bug, and it panics
    pub fn extract_max(&mut self) -> PriorityItem<V> {
        self.try_extract_max()
            .expect("this is a bug: extract_max called on an empty priority queue")
    }

    pub fn try_extract_max(&mut self) -> Option<PriorityItem<V>> {
        if self.heap.is_empty() {
            return None;
        }

        let last = self.heap.len() - 1;
        self.swap(0, last);
        let slot_index = self.heap.pop()?;
        if !self.heap.is_empty() {
            self.sift_down(0);
        }

        let slot = self.slots[slot_index].take()?;
        self.free_slots.push(slot_index);
        Some(slot.item)
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.slots.clear();
        self.free_slots.clear();
    }

    pub fn contains(&self, handle: ItemHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: ItemHandle) -> Option<&PriorityItem<V>> {
        match self.slots.get(handle.slot) {
            Some(Some(slot)) if slot.generation == handle.generation => Some(&slot.item),
            _ => None,
        }
    }

    /// Replaces an item's value and priority, moving it to its new place in the heap. Returns
    ///  the previous value, or `None` if the handle is stale - in that case the queue is
    ///  unchanged.
    pub fn update_priority(&mut self, handle: ItemHandle, value: V, priority: i64) -> Option<V> {
        let slot = match self.slots.get_mut(handle.slot) {
            Some(Some(slot)) if slot.generation == handle.generation => slot,
            _ => return None,
        };

        let old_value = std::mem::replace(&mut slot.item.value, value);
        slot.item.priority = priority;

        let heap_index = slot.heap_index;
        if !self.sift_up(heap_index) {
            self.sift_down(heap_index);
        }
        Some(old_value)
    }

    fn slot(&self, slot_index: usize) -> &Slot<V> {
        self.slots[slot_index].as_ref()
            .expect("this is a bug: heap refers to an empty slot")
    }

    fn outranks(&self, heap_a: usize, heap_b: usize) -> bool {
        self.slot(self.heap[heap_a]).item
            .outranks(&self.slot(self.heap[heap_b]).item)
    }

    fn swap(&mut self, heap_a: usize, heap_b: usize) {
        self.heap.swap(heap_a, heap_b);
        self.set_heap_index(heap_a);
        self.set_heap_index(heap_b);
    }

    fn set_heap_index(&mut self, heap_index: usize) {
        let slot_index = self.heap[heap_index];
        if let Some(slot) = self.slots[slot_index].as_mut() {
            slot.heap_index = heap_index;
        }
    }

    /// returns `true` if the element was moved
    fn sift_up(&mut self, mut heap_index: usize) -> bool {
        let start = heap_index;
        while heap_index > 0 {
            let parent = (heap_index - 1) / 2;
            if !self.outranks(heap_index, parent) {
                break;
            }
            self.swap(heap_index, parent);
            heap_index = parent;
        }
        heap_index != start
    }

    fn sift_down(&mut self, mut heap_index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * heap_index + 1;
            if left >= len {
                break;
            }
            let right = left + 1;

            let mut best = left;
            if right < len && self.outranks(right, left) {
                best = right;
            }
            if !self.outranks(best, heap_index) {
                break;
            }
            self.swap(heap_index, best);
            heap_index = best;
        }
    }
}
