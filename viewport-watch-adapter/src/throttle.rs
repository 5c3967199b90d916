use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use viewport_watch::{Handler, ObserverCollection};

use crate::Clock;

/// Rate-limits native scroll/resize events before they reach a viewport's coalescing handler.
///
/// Each wrapped handler forwards a call immediately when at least `interval_ms` have passed since
/// it last forwarded one (leading edge). Calls inside the window are remembered, and the adapter
/// flushes them with [`Throttle::tick`] once the window has elapsed (trailing edge), so the final
/// position of a burst is never lost.
///
/// Pass it by reference to [`viewport_watch::Viewport::new`]; one throttle can serve several
/// viewports, each with its own window.
pub struct Throttle<C> {
    clock: Rc<C>,
    interval_ms: u64,
    lanes: RefCell<Vec<Weak<Lane>>>,
    deferred: Rc<Cell<u64>>,
}

struct Lane {
    raw: Handler,
    interval_ms: u64,
    last_fired_ms: Cell<Option<u64>>,
    pending: Cell<bool>,
    deferred: Rc<Cell<u64>>,
}

impl Lane {
    fn is_open(&self, now_ms: u64) -> bool {
        match self.last_fired_ms.get() {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        }
    }

    fn call(&self, now_ms: u64) {
        if self.is_open(now_ms) {
            self.fire(now_ms);
            return;
        }
        self.pending.set(true);
        self.deferred.set(self.deferred.get().saturating_add(1));
        vtrace!(now_ms, "Throttle: call deferred");
    }

    fn fire(&self, now_ms: u64) {
        self.last_fired_ms.set(Some(now_ms));
        self.pending.set(false);
        (self.raw)();
    }
}

impl<C: Clock + 'static> Throttle<C> {
    pub fn new(clock: C, interval_ms: u64) -> Self {
        Self {
            clock: Rc::new(clock),
            interval_ms,
            lanes: RefCell::new(Vec::new()),
            deferred: Rc::new(Cell::new(0)),
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Forwards trailing calls whose window has elapsed.
    ///
    /// Call this from the adapter's timer or frame loop. Returns the number of calls forwarded.
    pub fn tick(&self) -> usize {
        let now_ms = self.clock.now_ms();
        let due: Vec<Rc<Lane>> = {
            let mut lanes = self.lanes.borrow_mut();
            lanes.retain(|lane| lane.strong_count() > 0);
            lanes
                .iter()
                .filter_map(Weak::upgrade)
                .filter(|lane| lane.pending.get() && lane.is_open(now_ms))
                .collect()
        };
        for lane in &due {
            lane.fire(now_ms);
        }
        if !due.is_empty() {
            vdebug!(forwarded = due.len(), now_ms, "Throttle::tick");
        }
        due.len()
    }

    /// Whether any wrapped handler holds a trailing call.
    pub fn has_pending(&self) -> bool {
        self.lanes
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .any(|lane| lane.pending.get())
    }

    /// Total calls held back so far, across all wrapped handlers.
    pub fn deferred(&self) -> u64 {
        self.deferred.get()
    }
}

impl<C: Clock + 'static> ObserverCollection for Throttle<C> {
    fn handle_scroll_resize(&self, handler: &Handler) -> Option<Handler> {
        let lane = Rc::new(Lane {
            raw: Rc::clone(handler),
            interval_ms: self.interval_ms,
            last_fired_ms: Cell::new(None),
            pending: Cell::new(false),
            deferred: Rc::clone(&self.deferred),
        });
        self.lanes.borrow_mut().push(Rc::downgrade(&lane));
        let clock = Rc::clone(&self.clock);
        Some(Rc::new(move || lane.call(clock.now_ms())))
    }
}

impl<C> fmt::Debug for Throttle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("interval_ms", &self.interval_ms)
            .field("lanes", &self.lanes.borrow().len())
            .field("deferred", &self.deferred.get())
            .finish_non_exhaustive()
    }
}
