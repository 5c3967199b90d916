use std::rc::Rc;

use viewport_watch::sim::SimHost;
use viewport_watch::{Container, Metrics, NativeEvent, Viewport};
use viewport_watch_adapter::{ManualClock, Probe, Recorder, Throttle};

fn main() {
    let host = Rc::new(SimHost::new().with_window(Metrics::new(800.0, 600.0)));
    let clock = ManualClock::new(0);
    let probe = Probe::wrapping(Throttle::new(clock.clone(), 100));

    let viewport = Viewport::new(Rc::clone(&host), Container::Document, &probe)
        .expect("sim host grants every subscription");
    let recorder = Rc::new(Recorder::new());
    viewport.observers().register(recorder.clone());

    // 60 wheel events over ~500ms, one per 8ms, with a frame every 16ms.
    for step in 0..60u64 {
        clock.set(step * 8);
        host.scroll_window_to(0.0, (step * 10) as f64);
        host.dispatch(NativeEvent::Scroll);
        probe.inner().tick();
        if step % 2 == 1 {
            host.run_frame();
        }
    }

    // Let the trailing edge through.
    clock.advance(100);
    probe.inner().tick();
    host.run_frame();

    println!("native events: {}", probe.events());
    println!("deferred by throttle: {}", probe.inner().deferred());
    println!("notifications: {}", recorder.len());
    println!("final: {:?}", recorder.latest());
}
