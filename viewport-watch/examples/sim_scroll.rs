use std::rc::Rc;

use viewport_watch::sim::SimHost;
use viewport_watch::{Container, Metrics, NativeEvent, Viewport, ViewportState};

fn main() {
    // Simulate a browser window; a real adapter would implement `Host` over its DOM bindings.
    let host = Rc::new(SimHost::new().with_window(Metrics::new(1280.0, 720.0)));
    let viewport = Viewport::new(Rc::clone(&host), Container::Document, ())
        .expect("sim host grants every subscription");

    viewport.observers().register_fn(|s: &ViewportState| {
        println!(
            "lazy-loader: y={} dir={:?} ({}x{})",
            s.position_y, s.direction_y, s.width, s.height
        );
    });
    viewport
        .observers()
        .register_fn(|s: &ViewportState| println!("sticky-header: y={}", s.position_y));

    // A burst of wheel events within one frame yields a single notification.
    for y in [40.0, 80.0, 120.0] {
        host.scroll_window_to(0.0, y);
        host.dispatch(NativeEvent::Scroll);
    }
    println!("frames run: {}", host.run_frame());

    host.scroll_window_to(0.0, 60.0);
    host.dispatch(NativeEvent::Scroll);
    host.run_frame();

    host.set_window(Metrics::new(1024.0, 768.0).with_scroll(0.0, 60.0));
    host.dispatch(NativeEvent::Resize);
    host.run_frame();

    println!("pull: {:?}", viewport.state());
    viewport.destroy();
    println!(
        "after destroy: {} scroll listeners",
        host.listener_count(NativeEvent::Scroll)
    );
}
