use alloc::boxed::Box;

use crate::error::HostError;
use crate::{FrameScheduler, Handler, Metrics, MutationOptions, NativeEvent, ReadyState};

/// The rendering environment a [`crate::Viewport`] runs in.
///
/// Everything the controller needs from the outside world goes through this trait: global event
/// subscription, a document-wide structural-change watch, readiness, geometry and frame
/// scheduling. A browser binding maps these onto `addEventListener`, `MutationObserver`,
/// `DOMContentLoaded` and `requestAnimationFrame`.
///
/// Subscriptions are returned as handles and released through the same host, so removal never
/// depends on handler identity or capture flags matching.
pub trait Host: FrameScheduler {
    /// A scrollable element that can be used as a [`crate::Container`].
    type Element: 'static;
    /// Handle for one event listener.
    type Listener: 'static;
    /// Handle for one structural-change watch.
    type Watch: 'static;

    fn add_listener(
        &self,
        event: NativeEvent,
        handler: Handler,
        capture: bool,
    ) -> Result<Self::Listener, HostError>;

    fn remove_listener(&self, listener: Self::Listener);

    fn observe_mutations(
        &self,
        handler: Handler,
        options: MutationOptions,
    ) -> Result<Self::Watch, HostError>;

    fn disconnect(&self, watch: Self::Watch);

    fn ready_state(&self) -> ReadyState;

    /// Runs `callback` once when the document stops loading.
    fn on_ready(&self, callback: Box<dyn FnOnce()>);

    /// Inner window size and page scroll offsets.
    fn window_metrics(&self) -> Metrics;

    /// Offset box size and scroll offsets of `element`.
    fn element_metrics(&self, element: &Self::Element) -> Metrics;
}
