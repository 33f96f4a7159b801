//! Single-threaded typed signals
//!
//! A `Signal<T>` broadcasts values to every live `Subscription<T>`. Each
//! subscription has its own queue, so a value invoked while nobody listens
//! is dropped. Dropping a subscription unsubscribes it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

struct Slot<T> {
    id: u64,
    queue: VecDeque<T>,
}

struct SignalInner<T> {
    next_id: u64,
    slots: Vec<Slot<T>>,
}

/// Broadcast point shared between a producer (a display) and the engine
pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T: Clone> Signal<T> {
    pub fn new() -> Self {
        Signal {
            inner: Rc::new(RefCell::new(SignalInner {
                next_id: 0,
                slots: Vec::new(),
            })),
        }
    }

    /// Queue `value` on every current subscription
    pub fn invoke(&self, value: T) {
        let mut inner = self.inner.borrow_mut();
        for slot in inner.slots.iter_mut() {
            slot.queue.push_back(value.clone());
        }
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.slots.push(Slot {
            id,
            queue: VecDeque::new(),
        });
        Subscription {
            id,
            signal: Rc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().slots.len()
    }
}

impl<T: Clone> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Clones share the same subscriber list
impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Signal {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.inner.borrow().slots.len())
            .finish()
    }
}

/// Live registration on a signal; unsubscribes on drop
pub struct Subscription<T> {
    id: u64,
    signal: Weak<RefCell<SignalInner<T>>>,
}

impl<T> Subscription<T> {
    /// Oldest pending value, if any
    pub fn try_recv(&self) -> Option<T> {
        let inner = self.signal.upgrade()?;
        let mut inner = inner.borrow_mut();
        inner
            .slots
            .iter_mut()
            .find(|slot| slot.id == self.id)
            .and_then(|slot| slot.queue.pop_front())
    }

    /// Discard pending values
    pub fn clear(&self) {
        if let Some(inner) = self.signal.upgrade() {
            if let Some(slot) = inner
                .borrow_mut()
                .slots
                .iter_mut()
                .find(|slot| slot.id == self.id)
            {
                slot.queue.clear();
            }
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.signal.upgrade() {
            // try_borrow_mut: never panic while unwinding from a borrow
            if let Ok(mut inner) = inner.try_borrow_mut() {
                inner.slots.retain(|slot| slot.id != self.id);
            }
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
