//! Adapter utilities for the `viewport-watch` crate.
//!
//! `viewport-watch` detects and coalesces viewport changes. This crate provides small,
//! framework-neutral pieces adapters commonly plug into it:
//!
//! - [`Throttle`]: rate-limits native scroll/resize events (leading edge plus ticked trailing edge)
//! - [`Probe`]: counts and traces native events, composing with another wrapper
//! - [`Recorder`]: an observer that keeps received states for pull-style consumers
//! - [`Clock`] / [`ManualClock`]: adapter-driven time
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod clock;
mod probe;
mod recorder;
mod throttle;


#[cfg(feature = "std")]
pub use clock::SystemClock;
pub use clock::{Clock, ManualClock};
pub use probe::Probe;
pub use recorder::Recorder;
pub use throttle::Throttle;
