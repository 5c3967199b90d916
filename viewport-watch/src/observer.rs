use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::ViewportState;

/// A native event handler as registered with the host.
///
/// Handler identity is pointer identity (`Rc::ptr_eq`).
pub type Handler = Rc<dyn Fn()>;

/// Anything that wants to be told about viewport changes.
pub trait Observer {
    fn check(&self, state: &ViewportState);
}

impl<F: Fn(&ViewportState)> Observer for F {
    fn check(&self, state: &ViewportState) {
        self(state)
    }
}

/// Supplies optional customization for a [`crate::Viewport`] at construction time.
///
/// `()` is the collection with no customization.
pub trait ObserverCollection {
    /// Wraps the controller's coalescing handler before it is subscribed to scroll and resize
    /// events, e.g. to throttle or trace native events.
    ///
    /// Returning `None` subscribes the coalescing handler as is. Structural-change notifications
    /// always use the unwrapped handler.
    fn handle_scroll_resize(&self, handler: &Handler) -> Option<Handler> {
        let _ = handler;
        None
    }
}

impl ObserverCollection for () {}

impl<C: ObserverCollection + ?Sized> ObserverCollection for &C {
    fn handle_scroll_resize(&self, handler: &Handler) -> Option<Handler> {
        (**self).handle_scroll_resize(handler)
    }
}

impl<C: ObserverCollection + ?Sized> ObserverCollection for Rc<C> {
    fn handle_scroll_resize(&self, handler: &Handler) -> Option<Handler> {
        (**self).handle_scroll_resize(handler)
    }
}

/// Identifies one registration in an [`ObserverRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

/// An ordered, externally mutable set of observers.
///
/// The registry is a live view: a sweep reads membership and order at the time it runs, by index,
/// from the most recently registered observer to the first. Observers added or removed while a
/// sweep is in progress are tolerated, but which of them the sweep visits is not specified.
#[derive(Default)]
pub struct ObserverRegistry {
    entries: RefCell<Vec<(ObserverId, Rc<dyn Observer>)>>,
    next_id: Cell<u64>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `observer`; it becomes the first one visited by the next sweep.
    pub fn register(&self, observer: Rc<dyn Observer>) -> ObserverId {
        let id = ObserverId(self.next_id.get());
        self.next_id.set(id.0.wrapping_add(1));
        self.entries.borrow_mut().push((id, observer));
        id
    }

    pub fn register_fn(&self, f: impl Fn(&ViewportState) + 'static) -> ObserverId {
        self.register(Rc::new(f))
    }

    /// Removes a registration. Returns `false` if `id` is not registered.
    pub fn unregister(&self, id: ObserverId) -> bool {
        let mut entries = self.entries.borrow_mut();
        match entries.iter().position(|(entry, _)| *entry == id) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: ObserverId) -> bool {
        self.entries.borrow().iter().any(|(entry, _)| *entry == id)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn get(&self, index: usize) -> Option<Rc<dyn Observer>> {
        self.entries
            .borrow()
            .get(index)
            .map(|(_, observer)| Rc::clone(observer))
    }

    pub fn ids(&self) -> Vec<ObserverId> {
        self.entries.borrow().iter().map(|(id, _)| *id).collect()
    }

    /// Calls `check` on every observer, last registered first.
    ///
    /// No borrow is held while an observer runs, so observers may mutate the registry. A panic in
    /// one observer skips the remaining ones and propagates.
    ///
    /// Returns the number of observers visited.
    pub fn sweep(&self, state: &ViewportState) -> usize {
        let mut visited = 0usize;
        let mut index = self.len();
        while index > 0 {
            index -= 1;
            // Shrunk below `index` by an earlier observer.
            let Some(observer) = self.get(index) else {
                continue;
            };
            observer.check(state);
            visited += 1;
        }
        visited
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
