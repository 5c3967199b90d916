use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::Cell;

/// A callback queued for the next rendering frame.
pub type FrameCallback = Box<dyn FnOnce()>;

/// The environment's "run on next rendering frame" primitive.
///
/// In a browser this is `requestAnimationFrame`; headless adapters can back it with a timer or a
/// manually ticked queue (see [`crate::sim::SimHost`]).
pub trait FrameScheduler {
    fn request_frame(&self, callback: FrameCallback);
}

/// A single-flight gate over a [`FrameScheduler`].
///
/// At most one invocation of the requested work is pending at any time. Requests made while a
/// frame is pending are absorbed; the work observes whatever state exists when the frame actually
/// runs, not when it was requested.
///
/// Clones share the same gate.
#[derive(Clone, Debug, Default)]
pub struct SingleFlight {
    scheduled: Rc<Cell<bool>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.get()
    }

    /// Schedules `work` for the next frame unless a frame is already pending.
    ///
    /// Returns `true` if a frame was requested, `false` if the call was absorbed.
    pub fn request_once<S: FrameScheduler + ?Sized>(
        &self,
        frames: &S,
        work: impl FnOnce() + 'static,
    ) -> bool {
        if self.scheduled.replace(true) {
            return false;
        }

        // The flag clears when the callback is consumed: after `work` returns, if `work` unwinds,
        // or if the scheduler drops the callback without running it.
        let idle = ClearOnDrop(Rc::clone(&self.scheduled));
        frames.request_frame(Box::new(move || {
            let _idle = idle;
            work();
        }));
        true
    }
}

struct ClearOnDrop(Rc<Cell<bool>>);

impl Drop for ClearOnDrop {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
