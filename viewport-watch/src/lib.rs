//! Frame-coalesced viewport change notifications.
//!
//! A [`Viewport`] watches one scrollable container (a specific element, or the whole document)
//! and tells a set of registered [`Observer`]s whenever its viewport may have changed: the user
//! scrolled, the window resized, or the document's structure mutated. Bursts of such events are
//! coalesced into a single notification per rendering frame.
//!
//! The crate is environment-agnostic. A [`Host`] implementation provides:
//! - scroll/resize event subscription on the global target
//! - a document-wide structural-change watch and a ready signal
//! - window and element geometry
//! - a "next frame" primitive ([`FrameScheduler`])
//!
//! [`sim::SimHost`] is a headless host for tests and non-graphical embedders.
//!
//! What to do about a change is up to the observers; this crate only detects, coalesces and
//! reports.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod direction;
mod error;
mod host;
mod observer;
mod scheduler;
pub mod sim;
mod types;
mod viewport;

#[cfg(test)]
mod tests;

pub use error::{Error, HostError, Result};
pub use host::Host;
pub use observer::{Handler, Observer, ObserverCollection, ObserverId, ObserverRegistry};
pub use scheduler::{FrameCallback, FrameScheduler, SingleFlight};
pub use types::{
    Container, DirectionX, DirectionY, Metrics, MutationOptions, NativeEvent, Position,
    ReadyState, ViewportState, WatchPhase,
};
pub use viewport::Viewport;
