use crate::sim::{SimElement, SimHost, SimListener, SimWatch};
use crate::*;

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

/// Collects every state it is handed, tagged with a name.
#[derive(Default)]
struct Log {
    calls: RefCell<Vec<(&'static str, ViewportState)>>,
}

impl Log {
    fn observer(log: &Rc<Self>, name: &'static str) -> Rc<dyn Observer> {
        let log = Rc::clone(log);
        Rc::new(move |state: &ViewportState| log.calls.borrow_mut().push((name, *state)))
    }

    fn names(&self) -> Vec<&'static str> {
        self.calls.borrow().iter().map(|(name, _)| *name).collect()
    }

    fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    fn last(&self) -> Option<ViewportState> {
        self.calls.borrow().last().map(|(_, state)| *state)
    }
}

/// `SimHost` that also counts geometry reads, i.e. state computations.
struct Counting {
    sim: SimHost,
    reads: Cell<usize>,
}

impl Counting {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            sim: SimHost::new().with_window(Metrics::new(800.0, 600.0)),
            reads: Cell::new(0),
        })
    }
}

impl FrameScheduler for Counting {
    fn request_frame(&self, callback: FrameCallback) {
        self.sim.request_frame(callback);
    }
}

impl Host for Counting {
    type Element = SimElement;
    type Listener = SimListener;
    type Watch = SimWatch;

    fn add_listener(
        &self,
        event: NativeEvent,
        handler: Handler,
        capture: bool,
    ) -> core::result::Result<SimListener, HostError> {
        self.sim.add_listener(event, handler, capture)
    }

    fn remove_listener(&self, listener: SimListener) {
        self.sim.remove_listener(listener);
    }

    fn observe_mutations(
        &self,
        handler: Handler,
        options: MutationOptions,
    ) -> core::result::Result<SimWatch, HostError> {
        self.sim.observe_mutations(handler, options)
    }

    fn disconnect(&self, watch: SimWatch) {
        self.sim.disconnect(watch);
    }

    fn ready_state(&self) -> ReadyState {
        self.sim.ready_state()
    }

    fn on_ready(&self, callback: Box<dyn FnOnce()>) {
        self.sim.on_ready(callback);
    }

    fn window_metrics(&self) -> Metrics {
        self.reads.set(self.reads.get() + 1);
        self.sim.window_metrics()
    }

    fn element_metrics(&self, element: &SimElement) -> Metrics {
        self.reads.set(self.reads.get() + 1);
        self.sim.element_metrics(element)
    }
}

fn document_viewport(host: &Rc<SimHost>) -> Viewport<SimHost> {
    Viewport::new(Rc::clone(host), Container::Document, ()).unwrap()
}

#[test]
fn k_triggers_in_one_frame_produce_one_computation_and_one_sweep() {
    for k in 1..=16usize {
        let host = Counting::new();
        let v = Viewport::new(Rc::clone(&host), Container::Document, ()).unwrap();
        let log = Rc::new(Log::default());
        v.observers().register(Log::observer(&log, "a"));
        v.observers().register(Log::observer(&log, "b"));

        for i in 0..k {
            if i % 3 == 2 {
                host.sim.mutate();
            } else if i % 2 == 0 {
                host.sim.dispatch(NativeEvent::Scroll);
            } else {
                host.sim.dispatch(NativeEvent::Resize);
            }
        }
        assert!(v.is_scheduled());
        assert_eq!(host.sim.pending_frames(), 1, "k={k}");
        assert_eq!(host.reads.get(), 0, "state is computed in the frame, not on trigger");

        assert_eq!(host.sim.run_frame(), 1);
        assert_eq!(host.reads.get(), 1, "k={k}");
        assert_eq!(log.names(), ["b", "a"], "k={k}");
        assert!(!v.is_scheduled());

        assert_eq!(host.sim.run_frame(), 0);
        assert_eq!(log.len(), 2);
    }
}

#[test]
fn observers_are_checked_in_reverse_registration_order() {
    let host = SimHost::new().into_rc();
    let v = document_viewport(&host);
    let log = Rc::new(Log::default());
    for name in ["A", "B", "C"] {
        v.observers().register(Log::observer(&log, name));
    }

    host.dispatch(NativeEvent::Scroll);
    host.run_frame();
    assert_eq!(log.names(), ["C", "B", "A"]);
}

#[test]
fn direction_inference_per_axis() {
    assert_eq!(DirectionX::infer(10.0, 15.0), DirectionX::Right);
    assert_eq!(DirectionX::infer(15.0, 10.0), DirectionX::Left);
    assert_eq!(DirectionX::infer(10.0, 10.0), DirectionX::None);
    assert_eq!(DirectionY::infer(10.0, 4.0), DirectionY::Up);
    assert_eq!(DirectionY::infer(4.0, 10.0), DirectionY::Down);
    assert_eq!(DirectionY::infer(10.0, 10.0), DirectionY::None);

    // No threshold.
    assert_eq!(DirectionY::infer(10.0, 10.000_001), DirectionY::Down);
    assert_eq!(DirectionX::infer(f64::NAN, 3.0), DirectionX::None);
}

#[test]
fn direction_is_relative_to_last_completed_notification() {
    let host = SimHost::new()
        .with_window(Metrics::new(800.0, 600.0).with_scroll(10.0, 10.0))
        .into_rc();
    let v = document_viewport(&host);
    let log = Rc::new(Log::default());
    v.observers().register(Log::observer(&log, "o"));

    host.dispatch(NativeEvent::Scroll);
    host.run_frame();
    assert_eq!(v.last_position(), Position::new(10.0, 10.0));

    host.scroll_window_to(15.0, 10.0);
    let s = v.state();
    assert_eq!(s.direction_x, DirectionX::Right);
    assert_eq!(s.direction_y, DirectionY::None);

    host.scroll_window_to(10.0, 4.0);
    let s = v.state();
    assert_eq!(s.direction_x, DirectionX::None);
    assert_eq!(s.direction_y, DirectionY::Up);

    host.scroll_window_to(10.0, 10.0);
    let s = v.state();
    assert_eq!(s.direction_x, DirectionX::None);
    assert_eq!(s.direction_y, DirectionY::None);
    assert!(!s.is_moving());

    // Pulling state never moves the reference point.
    assert_eq!(v.last_position(), Position::new(10.0, 10.0));
}

#[test]
fn last_position_updates_only_after_the_sweep() {
    let host = SimHost::new()
        .with_window(Metrics::new(800.0, 600.0))
        .into_rc();
    let v = Rc::new(document_viewport(&host));
    let seen = Rc::new(RefCell::new(Vec::new()));

    let weak: Weak<Viewport<SimHost>> = Rc::downgrade(&v);
    let seen_in = Rc::clone(&seen);
    v.observers().register_fn(move |state| {
        let v = weak.upgrade().unwrap();
        seen_in
            .borrow_mut()
            .push((v.last_position(), state.position()));
    });

    host.dispatch(NativeEvent::Scroll);
    host.scroll_window_to(0.0, 30.0);
    // Arrives during the frame wait: absorbed.
    host.dispatch(NativeEvent::Scroll);
    host.scroll_window_to(0.0, 50.0);
    assert_eq!(host.pending_frames(), 1);

    host.run_frame();
    assert_eq!(
        *seen.borrow(),
        [(Position::ORIGIN, Position::new(0.0, 50.0))],
        "observers see the old position as `last` and the frame-time position as state"
    );
    assert_eq!(v.last_position(), Position::new(0.0, 50.0));
}

#[test]
fn triggers_during_a_sweep_are_absorbed() {
    let host = SimHost::new().into_rc();
    let v = document_viewport(&host);
    let host_in = Rc::clone(&host);
    let calls = Rc::new(Cell::new(0usize));
    let calls_in = Rc::clone(&calls);
    v.observers().register_fn(move |_| {
        calls_in.set(calls_in.get() + 1);
        // Still scheduled while the sweep runs.
        host_in.dispatch(NativeEvent::Scroll);
    });

    host.dispatch(NativeEvent::Scroll);
    host.run_frame();
    assert_eq!(calls.get(), 1);
    assert_eq!(host.pending_frames(), 0);
    assert!(!v.is_scheduled());
}

#[test]
fn document_and_element_containers_read_their_own_geometry() {
    let host = SimHost::new()
        .with_window(Metrics::new(1280.0, 720.0).with_scroll(0.0, 400.0))
        .into_rc();
    let panel = host.add_element(Metrics::new(300.0, 200.0).with_scroll(25.0, 75.0));

    let doc = document_viewport(&host);
    let el = Viewport::new(Rc::clone(&host), Container::Element(panel), ()).unwrap();
    assert!(doc.container().is_document());
    assert_eq!(el.container().element(), Some(&panel));

    let d = doc.state();
    assert_eq!((d.width, d.height), (1280.0, 720.0));
    assert_eq!((d.position_x, d.position_y), (0.0, 400.0));
    assert_eq!(d.direction_y, DirectionY::Down);

    let e = el.state();
    assert_eq!((e.width, e.height), (300.0, 200.0));
    assert_eq!((e.position_x, e.position_y), (25.0, 75.0));
    assert_eq!(e.direction_x, DirectionX::Right);

    host.scroll_element_to(panel, 25.0, 10.0);
    let log = Rc::new(Log::default());
    el.observers().register(Log::observer(&log, "panel"));
    host.dispatch(NativeEvent::Scroll);
    host.run_frame();
    assert_eq!(log.last().unwrap().position_y, 10.0);
    assert_eq!(el.last_position(), Position::new(25.0, 10.0));
}

struct Wrapping {
    wrapped: RefCell<Option<Handler>>,
    raw_events: Rc<Cell<usize>>,
}

impl ObserverCollection for Wrapping {
    fn handle_scroll_resize(&self, handler: &Handler) -> Option<Handler> {
        let raw = Rc::clone(handler);
        let count = Rc::clone(&self.raw_events);
        let wrapped: Handler = Rc::new(move || {
            count.set(count.get() + 1);
            raw();
        });
        *self.wrapped.borrow_mut() = Some(Rc::clone(&wrapped));
        Some(wrapped)
    }
}

#[test]
fn custom_wrapper_is_the_subscribed_handler() {
    let host = SimHost::new().into_rc();
    let collection = Wrapping {
        wrapped: RefCell::new(None),
        raw_events: Rc::new(Cell::new(0)),
    };
    let v = Viewport::new(Rc::clone(&host), Container::Document, &collection).unwrap();
    let wrapped = collection.wrapped.borrow().clone().unwrap();

    assert!(Rc::ptr_eq(v.handler(), &wrapped));
    for event in NativeEvent::ALL {
        let listeners = host.listeners(event);
        assert_eq!(listeners.len(), 1);
        assert!(Rc::ptr_eq(&listeners[0], &wrapped), "{event}");
    }

    host.dispatch(NativeEvent::Scroll);
    host.dispatch(NativeEvent::Resize);
    assert_eq!(collection.raw_events.get(), 2);

    // Structural changes bypass the wrapper.
    host.mutate();
    assert_eq!(collection.raw_events.get(), 2);
    assert_eq!(host.pending_frames(), 1);
}

#[test]
fn subscribes_capturing_listeners_and_a_document_watch() {
    let host = SimHost::new().into_rc();
    let v = document_viewport(&host);

    assert_eq!(host.listener_count(NativeEvent::Scroll), 1);
    assert_eq!(host.listener_count(NativeEvent::Resize), 1);
    assert!(host.is_capturing(NativeEvent::Scroll));
    assert!(host.is_capturing(NativeEvent::Resize));
    assert_eq!(host.watch_options(), [MutationOptions::DOCUMENT]);
    assert_eq!(v.watch_phase(), WatchPhase::Active);
    assert!(Rc::ptr_eq(&host.listeners(NativeEvent::Scroll)[0], v.handler()));
}

#[test]
fn mutation_triggers_a_notification() {
    let host = SimHost::new().into_rc();
    let v = document_viewport(&host);
    let log = Rc::new(Log::default());
    v.observers().register(Log::observer(&log, "o"));

    assert_eq!(host.mutate(), 1);
    host.run_frame();
    assert_eq!(log.len(), 1);
}

#[test]
fn destroy_releases_every_subscription() {
    let host = SimHost::new().into_rc();
    let v = document_viewport(&host);
    v.destroy();

    assert!(v.is_destroyed());
    assert_eq!(host.listener_count(NativeEvent::Scroll), 0);
    assert_eq!(host.listener_count(NativeEvent::Resize), 0);
    assert_eq!(host.watch_count(), 0);
    assert_eq!(v.watch_phase(), WatchPhase::Released);
    assert!(!v.request_update());

    v.destroy();
    assert!(v.is_destroyed());
}

#[test]
fn destroy_while_document_is_loading_is_harmless() {
    let host = SimHost::loading().into_rc();
    let v = document_viewport(&host);
    assert_eq!(v.watch_phase(), WatchPhase::Pending);
    assert_eq!(host.watch_count(), 0);

    v.destroy();
    v.destroy();
    assert_eq!(v.watch_phase(), WatchPhase::Released);

    // The ready signal arriving later must not start a watch for a dead controller.
    host.finish_loading();
    assert_eq!(host.watch_count(), 0);
    assert_eq!(v.watch_phase(), WatchPhase::Released);
}

#[test]
fn deferred_watch_starts_when_the_document_is_ready() {
    let host = SimHost::loading().into_rc();
    let v = document_viewport(&host);
    let log = Rc::new(Log::default());
    v.observers().register(Log::observer(&log, "o"));

    // Scroll works before ready; structural changes are not watched yet.
    assert_eq!(host.mutate(), 0);
    assert_eq!(host.pending_ready_callbacks(), 1);

    host.finish_loading();
    assert_eq!(v.watch_phase(), WatchPhase::Active);
    assert_eq!(host.mutate(), 1);
    host.run_frame();
    assert_eq!(log.len(), 1);
}

#[test]
fn dropping_the_viewport_releases_subscriptions() {
    let host = SimHost::loading().into_rc();
    {
        let _v = document_viewport(&host);
        assert_eq!(host.listener_count(NativeEvent::Scroll), 1);
    }
    assert_eq!(host.listener_count(NativeEvent::Scroll), 0);
    assert_eq!(host.listener_count(NativeEvent::Resize), 0);

    host.finish_loading();
    assert_eq!(host.watch_count(), 0);
}

#[test]
fn frame_scheduled_before_destroy_does_not_notify() {
    let host = SimHost::new().into_rc();
    let v = document_viewport(&host);
    let log = Rc::new(Log::default());
    v.observers().register(Log::observer(&log, "o"));

    host.dispatch(NativeEvent::Scroll);
    v.destroy();
    assert_eq!(host.run_frame(), 1);
    assert_eq!(log.len(), 0);
    assert_eq!(v.last_position(), Position::ORIGIN);
}

#[test]
fn refused_listener_fails_construction_and_releases_the_rest() {
    let host = SimHost::new().into_rc();
    host.refuse_listener(NativeEvent::Resize);

    let err = Viewport::new(Rc::clone(&host), Container::Document, ()).unwrap_err();
    assert!(matches!(
        err,
        Error::Subscribe {
            event: NativeEvent::Resize,
            ..
        }
    ));
    assert_eq!(host.listener_count(NativeEvent::Scroll), 0);
    assert_eq!(host.watch_count(), 0);
}

#[test]
fn refused_watch_fails_construction_when_ready() {
    let host = SimHost::new().into_rc();
    host.refuse_mutations(true);

    let err = Viewport::new(Rc::clone(&host), Container::Document, ()).unwrap_err();
    assert!(matches!(err, Error::ObserveMutations { .. }));
    assert_eq!(host.listener_count(NativeEvent::Scroll), 0);
    assert_eq!(host.listener_count(NativeEvent::Resize), 0);
}

#[test]
fn refused_deferred_watch_is_reported() {
    let host = SimHost::loading().into_rc();
    let v = document_viewport(&host);
    host.refuse_mutations(true);
    host.finish_loading();

    assert_eq!(v.watch_phase(), WatchPhase::Failed);
    let err = v.watch_error().unwrap();
    assert_eq!(
        err,
        Error::ObserveMutations {
            source: HostError::new("mutation watch refused"),
        }
    );

    // Scroll and resize keep working.
    host.dispatch(NativeEvent::Scroll);
    assert_eq!(host.pending_frames(), 1);

    v.destroy();
    assert_eq!(v.watch_phase(), WatchPhase::Released);
}

#[test]
fn observer_can_unregister_itself_mid_sweep() {
    let host = SimHost::new().into_rc();
    let v = document_viewport(&host);
    let log = Rc::new(Log::default());
    v.observers().register(Log::observer(&log, "A"));
    v.observers().register(Log::observer(&log, "B"));

    let registry = Rc::downgrade(v.observers());
    let own_id = Rc::new(Cell::new(None));
    let own_id_in = Rc::clone(&own_id);
    let log_in = Rc::clone(&log);
    let id = v.observers().register_fn(move |state| {
        log_in.calls.borrow_mut().push(("once", *state));
        if let (Some(registry), Some(id)) = (registry.upgrade(), own_id_in.get()) {
            registry.unregister(id);
        }
    });
    own_id.set(Some(id));

    host.dispatch(NativeEvent::Scroll);
    host.run_frame();
    assert_eq!(log.names(), ["once", "B", "A"]);
    assert!(!v.observers().contains(id));

    host.dispatch(NativeEvent::Scroll);
    host.run_frame();
    assert_eq!(log.names(), ["once", "B", "A", "B", "A"]);
}

#[test]
fn clearing_the_registry_mid_sweep_skips_the_rest() {
    let host = SimHost::new().into_rc();
    let v = document_viewport(&host);
    let log = Rc::new(Log::default());
    v.observers().register(Log::observer(&log, "A"));
    let registry = Rc::downgrade(v.observers());
    v.observers().register_fn(move |_| {
        if let Some(registry) = registry.upgrade() {
            registry.clear();
        }
    });

    host.dispatch(NativeEvent::Scroll);
    host.run_frame();
    assert_eq!(log.len(), 0);
    assert!(v.observers().is_empty());
}

#[test]
fn panicking_observer_aborts_the_sweep_without_wedging_the_gate() {
    let host = SimHost::new()
        .with_window(Metrics::new(800.0, 600.0).with_scroll(0.0, 20.0))
        .into_rc();
    let v = document_viewport(&host);
    let log = Rc::new(Log::default());
    v.observers().register(Log::observer(&log, "A"));
    let armed = Rc::new(Cell::new(true));
    let armed_in = Rc::clone(&armed);
    v.observers().register_fn(move |_| {
        if armed_in.get() {
            panic!("observer failed");
        }
    });

    host.dispatch(NativeEvent::Scroll);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| host.run_frame()));
    assert!(result.is_err());
    assert_eq!(log.len(), 0, "earlier-registered observers are skipped");
    assert_eq!(v.last_position(), Position::ORIGIN);
    assert!(!v.is_scheduled());

    armed.set(false);
    host.dispatch(NativeEvent::Scroll);
    host.run_frame();
    assert_eq!(log.len(), 1);
    assert_eq!(v.last_position(), Position::new(0.0, 20.0));
}

#[test]
fn request_update_shares_the_gate_with_native_events() {
    let host = SimHost::new().into_rc();
    let v = document_viewport(&host);

    assert!(v.request_update());
    assert!(!v.request_update());
    host.dispatch(NativeEvent::Resize);
    assert_eq!(host.pending_frames(), 1);
    host.run_frame();
    assert!(v.request_update());
}

struct Discarding;

impl FrameScheduler for Discarding {
    fn request_frame(&self, callback: FrameCallback) {
        drop(callback);
    }
}

#[test]
fn single_flight_absorbs_requests_until_the_frame_runs() {
    let host = SimHost::new();
    let gate = SingleFlight::new();
    let runs = Rc::new(Cell::new(0usize));

    for _ in 0..3 {
        let runs = Rc::clone(&runs);
        gate.request_once(&host, move || runs.set(runs.get() + 1));
    }
    assert!(gate.is_scheduled());
    assert_eq!(host.pending_frames(), 1);

    host.run_frame();
    assert_eq!(runs.get(), 1);
    assert!(!gate.is_scheduled());
    assert!(gate.request_once(&host, || {}));
}

#[test]
fn single_flight_recovers_when_the_scheduler_drops_the_callback() {
    let gate = SingleFlight::new();
    assert!(gate.request_once(&Discarding, || unreachable!()));
    assert!(!gate.is_scheduled());
}

#[test]
fn registry_membership() {
    let registry = ObserverRegistry::new();
    assert!(registry.is_empty());
    let a = registry.register_fn(|_| {});
    let b = registry.register_fn(|_| {});
    assert_ne!(a, b);
    assert_eq!(registry.ids(), [a, b]);

    assert!(registry.unregister(a));
    assert!(!registry.unregister(a));
    assert!(!registry.contains(a));
    assert!(registry.contains(b));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.sweep(&ViewportState::default()), 1);
}

#[test]
fn error_messages_name_the_failure() {
    let err = Error::Subscribe {
        event: NativeEvent::Scroll,
        source: HostError::new("denied"),
    };
    assert_eq!(
        alloc::string::ToString::to_string(&err),
        "failed to subscribe to `scroll` events: denied"
    );
}

#[cfg(feature = "serde")]
#[test]
fn state_serializes_to_the_emitted_shape() {
    let state = ViewportState {
        width: 800.0,
        height: 600.0,
        position_x: 0.0,
        position_y: 120.0,
        direction_x: DirectionX::None,
        direction_y: DirectionY::Down,
    };
    let value = serde_json::to_value(state).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "width": 800.0,
            "height": 600.0,
            "positionX": 0.0,
            "positionY": 120.0,
            "directionX": "none",
            "directionY": "down",
        })
    );
}
