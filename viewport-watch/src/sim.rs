//! A deterministic, headless [`Host`].
//!
//! `SimHost` stands in for a browser window: geometry is set by hand, native events are fired with
//! [`SimHost::dispatch`] / [`SimHost::mutate`], and frames only advance when
//! [`SimHost::run_frame`] is called. It is what the crate's tests run against, and it works as a
//! frame source for non-graphical embedders that drive the viewport from a timer.
use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::format;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::error::HostError;
use crate::{
    FrameCallback, FrameScheduler, Handler, Host, Metrics, MutationOptions, NativeEvent,
    ReadyState,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SimElement(usize);

#[derive(Debug, PartialEq, Eq)]
pub struct SimListener(usize);

#[derive(Debug, PartialEq, Eq)]
pub struct SimWatch(usize);

struct ListenerEntry {
    event: NativeEvent,
    handler: Handler,
    capture: bool,
}

pub struct SimHost {
    window: Cell<Metrics>,
    elements: RefCell<Vec<Metrics>>,
    listeners: RefCell<Vec<Option<ListenerEntry>>>,
    watches: RefCell<Vec<Option<(Handler, MutationOptions)>>>,
    frames: RefCell<VecDeque<FrameCallback>>,
    ready: Cell<ReadyState>,
    ready_callbacks: RefCell<Vec<Box<dyn FnOnce()>>>,
    refused: RefCell<Vec<NativeEvent>>,
    refuse_mutations: Cell<bool>,
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHost {
    /// A host whose document has finished loading.
    pub fn new() -> Self {
        Self::with_ready_state(ReadyState::Complete)
    }

    /// A host whose document is still loading; see [`SimHost::finish_loading`].
    pub fn loading() -> Self {
        Self::with_ready_state(ReadyState::Loading)
    }

    pub fn with_ready_state(ready: ReadyState) -> Self {
        Self {
            window: Cell::new(Metrics::default()),
            elements: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
            watches: RefCell::new(Vec::new()),
            frames: RefCell::new(VecDeque::new()),
            ready: Cell::new(ready),
            ready_callbacks: RefCell::new(Vec::new()),
            refused: RefCell::new(Vec::new()),
            refuse_mutations: Cell::new(false),
        }
    }

    pub fn with_window(self, metrics: Metrics) -> Self {
        self.window.set(metrics);
        self
    }

    pub fn into_rc(self) -> Rc<Self> {
        Rc::new(self)
    }

    pub fn set_window(&self, metrics: Metrics) {
        self.window.set(metrics);
    }

    /// Moves the page scroll offsets without firing any event.
    pub fn scroll_window_to(&self, x: f64, y: f64) {
        self.window.set(self.window.get().with_scroll(x, y));
    }

    pub fn add_element(&self, metrics: Metrics) -> SimElement {
        let mut elements = self.elements.borrow_mut();
        elements.push(metrics);
        SimElement(elements.len() - 1)
    }

    pub fn set_element(&self, element: SimElement, metrics: Metrics) {
        if let Some(slot) = self.elements.borrow_mut().get_mut(element.0) {
            *slot = metrics;
        }
    }

    /// Moves an element's scroll offsets without firing any event.
    pub fn scroll_element_to(&self, element: SimElement, x: f64, y: f64) {
        if let Some(slot) = self.elements.borrow_mut().get_mut(element.0) {
            *slot = slot.with_scroll(x, y);
        }
    }

    /// Fires `event` on the global target. Returns the number of listeners invoked.
    pub fn dispatch(&self, event: NativeEvent) -> usize {
        let handlers = self.listeners(event);
        for handler in &handlers {
            handler();
        }
        handlers.len()
    }

    /// Reports a structural change to every active watch. Returns the number of watches invoked.
    pub fn mutate(&self) -> usize {
        let handlers: Vec<Handler> = self
            .watches
            .borrow()
            .iter()
            .flatten()
            .map(|(handler, _)| Rc::clone(handler))
            .collect();
        for handler in &handlers {
            handler();
        }
        handlers.len()
    }

    /// Flips the document out of `Loading` and runs the ready callbacks once.
    ///
    /// Does nothing if the document already finished loading.
    pub fn finish_loading(&self) {
        if !self.ready.get().is_loading() {
            return;
        }
        self.ready.set(ReadyState::Complete);
        let callbacks = core::mem::take(&mut *self.ready_callbacks.borrow_mut());
        for callback in callbacks {
            callback();
        }
    }

    /// Runs the frame callbacks queued so far. Callbacks requested while this frame runs wait for
    /// the next one.
    ///
    /// Returns the number of callbacks run.
    pub fn run_frame(&self) -> usize {
        let due = core::mem::take(&mut *self.frames.borrow_mut());
        let ran = due.len();
        for callback in due {
            callback();
        }
        ran
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Handlers currently registered for `event`, in registration order.
    pub fn listeners(&self, event: NativeEvent) -> Vec<Handler> {
        self.listeners
            .borrow()
            .iter()
            .flatten()
            .filter(|entry| entry.event == event)
            .map(|entry| Rc::clone(&entry.handler))
            .collect()
    }

    pub fn listener_count(&self, event: NativeEvent) -> usize {
        self.listeners
            .borrow()
            .iter()
            .flatten()
            .filter(|entry| entry.event == event)
            .count()
    }

    /// Whether every listener registered for `event` uses the capturing phase.
    pub fn is_capturing(&self, event: NativeEvent) -> bool {
        self.listeners
            .borrow()
            .iter()
            .flatten()
            .filter(|entry| entry.event == event)
            .all(|entry| entry.capture)
    }

    pub fn watch_count(&self) -> usize {
        self.watches.borrow().iter().flatten().count()
    }

    /// Options of the active watches, in registration order.
    pub fn watch_options(&self) -> Vec<MutationOptions> {
        self.watches
            .borrow()
            .iter()
            .flatten()
            .map(|(_, options)| *options)
            .collect()
    }

    pub fn pending_ready_callbacks(&self) -> usize {
        self.ready_callbacks.borrow().len()
    }

    /// Makes subsequent `add_listener` calls for `event` fail.
    pub fn refuse_listener(&self, event: NativeEvent) {
        self.refused.borrow_mut().push(event);
    }

    /// Makes subsequent `observe_mutations` calls fail (or succeed again).
    pub fn refuse_mutations(&self, refuse: bool) {
        self.refuse_mutations.set(refuse);
    }
}

impl FrameScheduler for SimHost {
    fn request_frame(&self, callback: FrameCallback) {
        self.frames.borrow_mut().push_back(callback);
    }
}

impl Host for SimHost {
    type Element = SimElement;
    type Listener = SimListener;
    type Watch = SimWatch;

    fn add_listener(
        &self,
        event: NativeEvent,
        handler: Handler,
        capture: bool,
    ) -> Result<SimListener, HostError> {
        if self.refused.borrow().contains(&event) {
            return Err(HostError::new(format!("`{event}` listener refused")));
        }
        let mut listeners = self.listeners.borrow_mut();
        listeners.push(Some(ListenerEntry {
            event,
            handler,
            capture,
        }));
        Ok(SimListener(listeners.len() - 1))
    }

    fn remove_listener(&self, listener: SimListener) {
        if let Some(slot) = self.listeners.borrow_mut().get_mut(listener.0) {
            *slot = None;
        }
    }

    fn observe_mutations(
        &self,
        handler: Handler,
        options: MutationOptions,
    ) -> Result<SimWatch, HostError> {
        if self.refuse_mutations.get() {
            return Err(HostError::new("mutation watch refused"));
        }
        let mut watches = self.watches.borrow_mut();
        watches.push(Some((handler, options)));
        Ok(SimWatch(watches.len() - 1))
    }

    fn disconnect(&self, watch: SimWatch) {
        if let Some(slot) = self.watches.borrow_mut().get_mut(watch.0) {
            *slot = None;
        }
    }

    fn ready_state(&self) -> ReadyState {
        self.ready.get()
    }

    /// Like `DOMContentLoaded`: a callback registered after loading finished never runs.
    fn on_ready(&self, callback: Box<dyn FnOnce()>) {
        if self.ready.get().is_loading() {
            self.ready_callbacks.borrow_mut().push(callback);
        }
    }

    fn window_metrics(&self) -> Metrics {
        self.window.get()
    }

    fn element_metrics(&self, element: &SimElement) -> Metrics {
        self.elements
            .borrow()
            .get(element.0)
            .copied()
            .unwrap_or_default()
    }
}

impl fmt::Debug for SimHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimHost")
            .field("window", &self.window.get())
            .field("elements", &self.elements.borrow().len())
            .field("scroll_listeners", &self.listener_count(NativeEvent::Scroll))
            .field("resize_listeners", &self.listener_count(NativeEvent::Resize))
            .field("watches", &self.watch_count())
            .field("pending_frames", &self.pending_frames())
            .field("ready", &self.ready.get())
            .finish_non_exhaustive()
    }
}
