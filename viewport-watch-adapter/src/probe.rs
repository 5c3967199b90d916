use alloc::rc::Rc;
use core::cell::Cell;

use viewport_watch::{Handler, ObserverCollection};

/// A debugging wrapper that counts (and, with `feature = "tracing"`, traces) every native
/// scroll/resize event before handing it on.
///
/// `Probe` composes with another collection's wrapper: the probe sees every raw event, and the
/// inner collection decides what reaches the viewport.
///
/// ```
/// use viewport_watch_adapter::{ManualClock, Probe, Throttle};
///
/// let probe = Probe::wrapping(Throttle::new(ManualClock::new(0), 16));
/// assert_eq!(probe.events(), 0);
/// ```
#[derive(Debug, Default)]
pub struct Probe<C = ()> {
    inner: C,
    events: Rc<Cell<u64>>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C> Probe<C> {
    pub fn wrapping(inner: C) -> Self {
        Self {
            inner,
            events: Rc::new(Cell::new(0)),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Native events seen since creation (or the last [`Probe::reset`]).
    pub fn events(&self) -> u64 {
        self.events.get()
    }

    pub fn reset(&self) {
        self.events.set(0);
    }
}

impl<C: ObserverCollection> ObserverCollection for Probe<C> {
    fn handle_scroll_resize(&self, handler: &Handler) -> Option<Handler> {
        let next = self
            .inner
            .handle_scroll_resize(handler)
            .unwrap_or_else(|| Rc::clone(handler));
        let events = Rc::clone(&self.events);
        Some(Rc::new(move || {
            let seen = events.get().saturating_add(1);
            events.set(seen);
            vtrace!(seen, "Probe: native event");
            next();
        }))
    }
}
