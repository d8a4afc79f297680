//! reveal.rs
//!
//! Count-up animation for a single counter: emits 0, 1, ..., target with a
//! pause after every value but the last. The pauses grow geometrically so
//! the count visibly slows down, ending at roughly twice the first pause.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::time::sleep;
use tracing::trace;

/// Last pause relative to the first one
const SLOWDOWN: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Every value up to the target was emitted
    Completed,
    /// The tick callback asked to stop before the target was reached
    Superseded,
}

/// The reveal schedule without any sleeping.
///
/// Yields `(value, pause)` for each value in `0..=target`, where `pause` is
/// how long to wait before the next value (`None` after the last one).
#[derive(Debug, Clone)]
pub struct RevealCurve {
    next: Option<u32>,
    target: u32,
    delay: Duration,
    multiplier: f64,
}

impl RevealCurve {
    pub fn new(target: u32, duration: Duration) -> Self {
        if target == 0 {
            return Self {
                next: Some(0),
                target,
                delay: Duration::ZERO,
                multiplier: 1.0,
            };
        }

        let delay = duration / target;
        // (end_delay / delay)^(1/target), with end_delay = SLOWDOWN * delay
        let multiplier = SLOWDOWN.powf(1.0 / f64::from(target));

        Self {
            next: Some(0),
            target,
            delay,
            multiplier,
        }
    }
}

impl Iterator for RevealCurve {
    type Item = (u32, Option<Duration>);

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.next?;
        if value == self.target {
            self.next = None;
            return Some((value, None));
        }

        let pause = self.delay;
        self.delay = self.delay.mul_f64(self.multiplier);
        self.next = Some(value + 1);
        Some((value, Some(pause)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self
            .next
            .map_or(0, |value| (self.target - value) as usize + 1);
        (left, Some(left))
    }
}

impl ExactSizeIterator for RevealCurve {}

/// Counts from 0 up to `target` over roughly `duration`, calling `on_tick`
/// with every value.
///
/// `on_tick` returning `Break` ends the reveal immediately; no further
/// values are emitted and the pending pause is not awaited.
pub async fn reveal<F>(target: u32, duration: Duration, mut on_tick: F) -> RevealOutcome
where
    F: FnMut(u32) -> ControlFlow<()>,
{
    for (value, pause) in RevealCurve::new(target, duration) {
        if on_tick(value).is_break() {
            trace!(value, target, "reveal stopped");
            return RevealOutcome::Superseded;
        }
        if let Some(pause) = pause {
            sleep(pause).await;
        }
    }
    RevealOutcome::Completed
}
