use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::cell::RefCell;

use viewport_watch::{Observer, ViewportState};

/// An observer that keeps the states it receives, for pull-style adapters and tests.
///
/// Register it through an `Rc`:
///
/// ```
/// use std::rc::Rc;
/// use viewport_watch::{Container, Metrics, NativeEvent, Viewport, sim::SimHost};
/// use viewport_watch_adapter::Recorder;
///
/// let host = Rc::new(SimHost::new().with_window(Metrics::new(800.0, 600.0)));
/// let viewport = Viewport::new(Rc::clone(&host), Container::Document, ()).unwrap();
/// let recorder = Rc::new(Recorder::new());
/// viewport.observers().register(recorder.clone());
///
/// host.dispatch(NativeEvent::Resize);
/// host.run_frame();
/// assert_eq!(recorder.latest().map(|s| s.width), Some(800.0));
/// ```
#[derive(Debug, Default)]
pub struct Recorder {
    states: RefCell<VecDeque<ViewportState>>,
    capacity: Option<usize>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only the most recent `capacity` states.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            states: RefCell::new(VecDeque::with_capacity(capacity)),
            capacity: Some(capacity),
        }
    }

    pub fn states(&self) -> Vec<ViewportState> {
        self.states.borrow().iter().copied().collect()
    }

    pub fn latest(&self) -> Option<ViewportState> {
        self.states.borrow().back().copied()
    }

    pub fn len(&self) -> usize {
        self.states.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.states.borrow_mut().clear();
    }

    /// Drains everything recorded so far, oldest first.
    pub fn take(&self) -> Vec<ViewportState> {
        self.states.borrow_mut().drain(..).collect()
    }
}

impl Observer for Recorder {
    fn check(&self, state: &ViewportState) {
        let mut states = self.states.borrow_mut();
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return;
            }
            while states.len() >= capacity {
                states.pop_front();
            }
        }
        states.push_back(*state);
    }
}
