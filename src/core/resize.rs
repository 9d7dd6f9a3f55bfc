//! Host resize notifications.
//!
//! The host feeds window or container resizes into a [`ResizeSignal`]. Each
//! subscriber holds a [`ResizeSubscription`] that keeps only the latest
//! pending size; dropping the subscription detaches it from the signal.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::surface::SurfaceSize;

type PendingSlot = Rc<Cell<Option<SurfaceSize>>>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    slots: Vec<(u64, PendingSlot)>,
}

/// Host-side resize notification source
#[derive(Clone, Default)]
pub struct ResizeSignal {
    listeners: Rc<RefCell<Listeners>>,
}

impl ResizeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener; it stays attached until the subscription drops
    pub fn subscribe(&self) -> ResizeSubscription {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;

        let pending: PendingSlot = Rc::new(Cell::new(None));
        listeners.slots.push((id, Rc::clone(&pending)));

        ResizeSubscription {
            id,
            pending,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    /// Deliver a new size to every attached listener
    pub fn notify(&self, size: SurfaceSize) {
        for (_, slot) in self.listeners.borrow().slots.iter() {
            slot.set(Some(size));
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().slots.len()
    }
}

/// Scoped resize listener
///
/// Sizes coalesce: only the most recent notification is kept until taken.
pub struct ResizeSubscription {
    id: u64,
    pending: PendingSlot,
    listeners: Weak<RefCell<Listeners>>,
}

impl ResizeSubscription {
    /// Take the latest size notified since the previous call
    pub fn take(&self) -> Option<SurfaceSize> {
        self.pending.take()
    }
}

impl Drop for ResizeSubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .borrow_mut()
                .slots
                .retain(|(id, _)| *id != self.id);
        }
    }
}
