use slab::Slab;

pub type UpdateKey = usize;

/// One pending state transition.
pub struct Update<A> {
    pub action: A,
    /// Past this point the update is treated as urgent.
    pub expiration_time: f64,
    next: UpdateKey,
}

/// Pending updates threaded into a closed ring, stored in a slab and linked by key.
///
/// `last` points at the most recently enqueued update; its `next` is the
/// oldest one. An empty queue has no `last` at all, there is no sentinel.
pub struct UpdateQueue<A> {
    slots: Slab<Update<A>>,
    last: Option<UpdateKey>,
}

impl<A> Default for UpdateQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> UpdateQueue<A> {
    pub fn new() -> Self {
        Self {
            slots: Slab::new(),
            last: None,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_none()
    }

    /// Append after the current tail, keeping the ring closed. O(1).
    pub fn enqueue(&mut self, action: A, expiration_time: f64) -> UpdateKey {
        let key = self.slots.vacant_key();
        let next = match self.last {
            None => key,
            Some(last) => std::mem::replace(&mut self.slots[last].next, key),
        };
        self.slots.insert(Update {
            action,
            expiration_time,
            next,
        });
        self.last = Some(key);
        key
    }

    /// The oldest pending update.
    pub fn head(&self) -> Option<UpdateKey> {
        self.last.map(|last| self.slots[last].next)
    }

    pub fn get(&self, key: UpdateKey) -> Option<&Update<A>> {
        self.slots.get(key)
    }

    /// Successor of `key` in the ring.
    pub fn next(&self, key: UpdateKey) -> Option<UpdateKey> {
        self.slots.get(key).map(|update| update.next)
    }

    /// Walks the ring once, oldest first.
    pub fn iter(&self) -> Iter<'_, A> {
        Iter {
            queue: self,
            cursor: self.head(),
            remaining: self.len(),
        }
    }

    /// The update with the earliest expiration. Ties go to the older update. O(N).
    pub fn peek_most_urgent(&self) -> Option<&Update<A>> {
        self.iter().fold(None, |best: Option<&Update<A>>, update| match best {
            Some(best) if best.expiration_time <= update.expiration_time => Some(best),
            _ => Some(update),
        })
    }

    /// Remove every update in insertion order, leaving the queue empty.
    pub fn drain_in_order(&mut self) -> Vec<Update<A>> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head();
        for _ in 0..self.len() {
            let Some(key) = cursor else { break };
            keys.push(key);
            cursor = self.next(key);
        }

        self.last = None;
        let drained = keys.into_iter().map(|key| self.slots.remove(key)).collect();
        self.slots.clear();
        drained
    }
}

pub struct Iter<'a, A> {
    queue: &'a UpdateQueue<A>,
    cursor: Option<UpdateKey>,
    remaining: usize,
}

impl<'a, A> Iterator for Iter<'a, A> {
    type Item = &'a Update<A>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let update = self.queue.get(self.cursor?)?;
        self.remaining -= 1;
        self.cursor = Some(update.next);
        Some(update)
    }
}
