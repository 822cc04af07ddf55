//! Recency Index Module
//!
//! Arena-backed doubly-linked list that keeps entries ordered by recency.
//!
//! - Front = Most recently used
//! - Back = Least recently used
//!
//! Nodes live in a `Vec` and link to each other by slot index. Callers hold
//! [`Handle`]s, which pair a slot index with the generation the slot had when
//! the node was inserted; a slot's generation is bumped whenever it is freed,
//! so a handle to a removed node can never reach whatever reuses the slot.
//! No locking happens here: the owner serializes access.

// == Handle ==
/// Stable, generation-checked reference to a node in a [`RecencyIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: usize,
    generation: u64,
}

#[derive(Debug)]
struct Node<T> {
    item: T,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u64,
    node: Option<Node<T>>,
}

// == Recency Index ==
/// Recency-ordered arena list with O(1) push, move-to-front and removal.
#[derive(Debug)]
pub struct RecencyIndex<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Default for RecencyIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecencyIndex<T> {
    // == Constructor ==
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Push Front ==
    /// Inserts an item as the most recently used and returns its handle.
    pub fn push_front(&mut self, item: T) -> Handle {
        let node = Node {
            item,
            prev: None,
            next: None,
        };
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index].node = Some(node);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                self.slots.len() - 1
            }
        };
        self.link_front(index);
        self.len += 1;
        Handle {
            index,
            generation: self.slots[index].generation,
        }
    }

    // == Move To Front ==
    /// Marks the node as most recently used.
    ///
    /// Returns false if the handle is stale.
    pub fn move_to_front(&mut self, handle: Handle) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        if self.head != Some(handle.index) {
            self.unlink(handle.index);
            self.link_front(handle.index);
        }
        true
    }

    // == Remove ==
    /// Unlinks the node and hands back its item.
    ///
    /// Returns None if the handle is stale.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        if !self.is_live(handle) {
            return None;
        }
        self.unlink(handle.index);
        let slot = &mut self.slots[handle.index];
        slot.generation += 1;
        let node = slot.node.take()?;
        self.free.push(handle.index);
        self.len -= 1;
        Some(node.item)
    }

    // == Pop Back ==
    /// Removes and returns the least recently used item.
    pub fn pop_back(&mut self) -> Option<T> {
        let handle = self.back()?;
        self.remove(handle)
    }

    // == Back / Front ==
    /// Handle of the least recently used node.
    pub fn back(&self) -> Option<Handle> {
        self.tail.map(|index| self.handle_at(index))
    }

    /// Handle of the most recently used node.
    pub fn front(&self) -> Option<Handle> {
        self.head.map(|index| self.handle_at(index))
    }

    // == Access ==
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.node.as_ref())
            .map(|node| &node.item)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.node.as_mut())
            .map(|node| &mut node.item)
    }

    // == Iteration ==
    /// Walks the list from most to least recently used.
    ///
    /// Each call starts a fresh walk over the current order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            index: self,
            current: self.head,
            remaining: self.len,
        }
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Clear ==
    /// Drops every node. Outstanding handles become stale.
    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.generation += 1;
            }
            self.free.push(index);
        }
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    // == Internal linked-list operations ==

    fn is_live(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    fn handle_at(&self, index: usize) -> Handle {
        Handle {
            index,
            generation: self.slots[index].generation,
        }
    }

    fn node_mut(&mut self, index: usize) -> &mut Node<T> {
        self.slots[index]
            .node
            .as_mut()
            .expect("linked slot must hold a node")
    }

    fn link_front(&mut self, index: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(index);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(head) => self.node_mut(head).prev = Some(index),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
    }

    fn unlink(&mut self, index: usize) {
        let (prev, next) = {
            let node = self.node_mut(index);
            (node.prev.take(), node.next.take())
        };
        match prev {
            Some(prev) => self.node_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev = prev,
            None => self.tail = prev,
        }
    }
}

// == Iterator ==
/// Front-to-back iterator over `(Handle, &T)`.
pub struct Iter<'a, T> {
    index: &'a RecencyIndex<T>,
    current: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        let index = self.index;
        let slot = &index.slots[current];
        let node = slot.node.as_ref()?;
        self.current = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((
            Handle {
                index: current,
                generation: slot.generation,
            },
            &node.item,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
