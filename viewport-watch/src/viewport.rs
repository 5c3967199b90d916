use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::error::{Error, Result};
use crate::{
    Container, Handler, Host, MutationOptions, NativeEvent, ObserverCollection, ObserverRegistry,
    Position, SingleFlight, ViewportState, WatchPhase,
};

enum WatchSlot<W> {
    Pending,
    Active(W),
    Failed(Error),
    Released,
}

impl<W> WatchSlot<W> {
    fn phase(&self) -> WatchPhase {
        match self {
            Self::Pending => WatchPhase::Pending,
            Self::Active(_) => WatchPhase::Active,
            Self::Failed(_) => WatchPhase::Failed,
            Self::Released => WatchPhase::Released,
        }
    }
}

/// Watches one scrollable container and notifies observers at most once per frame.
///
/// On construction the controller subscribes to scroll and resize events (capturing phase, so
/// nested scrollable regions count too) and to structural changes anywhere in the document. Every
/// such event funnels into a [`SingleFlight`] gate; when the frame fires, the current
/// [`ViewportState`] is computed and handed to every registered observer, last registered first.
///
/// Subscriptions are released by [`Viewport::destroy`] or when the viewport is dropped.
pub struct Viewport<H: Host + 'static> {
    inner: Rc<Inner<H>>,
}

struct Inner<H: Host + 'static> {
    this: Weak<Inner<H>>,
    host: Rc<H>,
    container: Container<H::Element>,
    observers: Rc<ObserverRegistry>,
    last: Cell<Position>,
    gate: SingleFlight,
    // Coalescing entry point; structural changes always go through it directly.
    raw: Handler,
    // What scroll/resize listeners were registered with (possibly wrapped).
    handler: Handler,
    listeners: RefCell<Vec<H::Listener>>,
    watch: RefCell<WatchSlot<H::Watch>>,
    destroyed: Cell<bool>,
}

impl<H: Host + 'static> Viewport<H> {
    /// Creates a controller for `container` and subscribes it to `host`.
    ///
    /// If the document is still loading, the structural-change watch starts on the host's ready
    /// signal instead (see [`Viewport::watch_phase`]).
    ///
    /// Fails if the host refuses a subscription; anything acquired before the failure is
    /// released.
    pub fn new(
        host: Rc<H>,
        container: Container<H::Element>,
        collection: impl ObserverCollection,
    ) -> Result<Self> {
        let inner = Rc::new_cyclic(|this: &Weak<Inner<H>>| {
            let raw = coalescing_handler(Weak::clone(this));
            let handler = collection
                .handle_scroll_resize(&raw)
                .unwrap_or_else(|| Rc::clone(&raw));
            Inner {
                this: Weak::clone(this),
                host,
                container,
                observers: Rc::new(ObserverRegistry::new()),
                last: Cell::new(Position::ORIGIN),
                gate: SingleFlight::new(),
                raw,
                handler,
                listeners: RefCell::new(Vec::new()),
                watch: RefCell::new(WatchSlot::Pending),
                destroyed: Cell::new(false),
            }
        });

        // Early returns drop `viewport`, which releases whatever was acquired so far.
        let viewport = Self { inner };
        vdebug!(
            document = viewport.inner.container.is_document(),
            wrapped = !Rc::ptr_eq(&viewport.inner.raw, &viewport.inner.handler),
            "Viewport::new"
        );

        for event in NativeEvent::ALL {
            viewport.inner.listen(event)?;
        }

        if viewport.inner.host.ready_state().is_loading() {
            vdebug!("document still loading; deferring structural-change watch");
            let this = Weak::clone(&viewport.inner.this);
            viewport.inner.host.on_ready(Box::new(move || {
                if let Some(inner) = this.upgrade() {
                    inner.activate_deferred_watch();
                }
            }));
        } else {
            viewport.inner.start_watch()?;
        }

        Ok(viewport)
    }

    /// Computes the current viewport state without notifying anyone.
    ///
    /// Direction is relative to the position recorded by the last completed notification.
    pub fn state(&self) -> ViewportState {
        self.inner.state()
    }

    /// Releases all native subscriptions.
    ///
    /// A pending structural-change watch will never start, and a frame that is already scheduled
    /// runs as a no-op. Calling this more than once is harmless.
    pub fn destroy(&self) {
        self.inner.release();
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// The live observer set. Membership may change at any time, including between frames.
    pub fn observers(&self) -> &Rc<ObserverRegistry> {
        &self.inner.observers
    }

    pub fn container(&self) -> &Container<H::Element> {
        &self.inner.container
    }

    pub fn host(&self) -> &Rc<H> {
        &self.inner.host
    }

    /// Position as of the most recently completed notification.
    pub fn last_position(&self) -> Position {
        self.inner.last.get()
    }

    /// Whether a notification is waiting for the next frame.
    pub fn is_scheduled(&self) -> bool {
        self.inner.gate.is_scheduled()
    }

    /// The handler subscribed to scroll and resize events.
    pub fn handler(&self) -> &Handler {
        &self.inner.handler
    }

    pub fn watch_phase(&self) -> WatchPhase {
        self.inner.watch.borrow().phase()
    }

    /// The host's refusal of a deferred structural-change watch, if any.
    pub fn watch_error(&self) -> Option<Error> {
        match &*self.inner.watch.borrow() {
            WatchSlot::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }

    /// Requests a coalesced notification as if a native event had fired.
    ///
    /// Returns `false` if a notification was already pending (or the viewport is destroyed).
    pub fn request_update(&self) -> bool {
        self.inner.schedule()
    }
}

impl<H: Host + 'static> Drop for Viewport<H> {
    fn drop(&mut self) {
        self.inner.release();
    }
}

impl<H: Host + 'static> fmt::Debug for Viewport<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("document", &self.inner.container.is_document())
            .field("observers", &self.inner.observers.len())
            .field("last", &self.inner.last.get())
            .field("scheduled", &self.inner.gate.is_scheduled())
            .field("watch", &self.watch_phase())
            .field("destroyed", &self.inner.destroyed.get())
            .finish_non_exhaustive()
    }
}

fn coalescing_handler<H: Host + 'static>(this: Weak<Inner<H>>) -> Handler {
    Rc::new(move || {
        if let Some(inner) = this.upgrade() {
            inner.schedule();
        }
    })
}

impl<H: Host + 'static> Inner<H> {
    fn listen(&self, event: NativeEvent) -> Result<()> {
        let listener = self
            .host
            .add_listener(event, Rc::clone(&self.handler), true)
            .map_err(|source| Error::Subscribe { event, source })?;
        self.listeners.borrow_mut().push(listener);
        Ok(())
    }

    fn start_watch(&self) -> Result<()> {
        let watch = self
            .host
            .observe_mutations(Rc::clone(&self.raw), MutationOptions::DOCUMENT)
            .map_err(|source| Error::ObserveMutations { source })?;
        *self.watch.borrow_mut() = WatchSlot::Active(watch);
        Ok(())
    }

    fn activate_deferred_watch(&self) {
        if !matches!(*self.watch.borrow(), WatchSlot::Pending) {
            return;
        }
        match self.start_watch() {
            Ok(()) => {
                vdebug!("structural-change watch started after ready");
            }
            Err(err) => {
                vwarn!(error = %err, "deferred structural-change watch refused");
                *self.watch.borrow_mut() = WatchSlot::Failed(err);
            }
        }
    }

    fn schedule(&self) -> bool {
        if self.destroyed.get() {
            return false;
        }
        let this = Weak::clone(&self.this);
        self.gate.request_once(&*self.host, move || {
            if let Some(inner) = this.upgrade() {
                inner.notify();
            }
        })
    }

    fn notify(&self) {
        if self.destroyed.get() {
            vtrace!("frame fired after destroy; skipping");
            return;
        }
        let state = self.state();
        self.observers.sweep(&state);
        self.last.set(state.position());
        vtrace!(
            x = state.position_x,
            y = state.position_y,
            observers = self.observers.len(),
            "viewport notified"
        );
    }

    fn state(&self) -> ViewportState {
        let metrics = match &self.container {
            Container::Document => self.host.window_metrics(),
            Container::Element(element) => self.host.element_metrics(element),
        };
        ViewportState::from_metrics(metrics, self.last.get())
    }

    fn release(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        let listeners = core::mem::take(&mut *self.listeners.borrow_mut());
        for listener in listeners {
            self.host.remove_listener(listener);
        }
        if let WatchSlot::Active(watch) = self.watch.replace(WatchSlot::Released) {
            self.host.disconnect(watch);
        }
        vdebug!("viewport destroyed");
    }
}
