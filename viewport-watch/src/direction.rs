//! Per-axis direction inference.
//!
//! A plain three-way comparison of the previous and current offset. There is no smoothing or
//! threshold: any nonzero delta yields a direction.
use core::cmp::Ordering;

use crate::{DirectionX, DirectionY};

fn step(last: f64, current: f64) -> Option<Ordering> {
    current.partial_cmp(&last)
}

impl DirectionX {
    pub fn infer(last: f64, current: f64) -> Self {
        match step(last, current) {
            Some(Ordering::Greater) => Self::Right,
            Some(Ordering::Less) => Self::Left,
            // NaN on either side compares as "no movement".
            Some(Ordering::Equal) | None => Self::None,
        }
    }
}

impl DirectionY {
    pub fn infer(last: f64, current: f64) -> Self {
        match step(last, current) {
            Some(Ordering::Greater) => Self::Down,
            Some(Ordering::Less) => Self::Up,
            Some(Ordering::Equal) | None => Self::None,
        }
    }
}
