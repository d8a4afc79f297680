//! view.rs
//!
//! The form shell: takes a submission, validates it, works out the age and
//! drives the three counters that the renderer displays.
//!
//! Every submission gets a new generation number. A counter tick is only
//! applied while the state still carries that number, so a newer submission
//! (valid or not) silently retires every reveal that is still running.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::age::{AgeComponents, age_between};
use crate::config::Config;
use crate::reveal::{RevealOutcome, reveal};
use crate::validate::{RawDateInput, ValidationErrors, validate};

/// Shown in place of a counter that has no value
pub const EMPTY: &str = "- -";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Years,
    Months,
    Days,
}

/// What the renderer draws
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgeViewState {
    /// Submission that owns the counters
    pub generation: u64,
    pub years: Option<u32>,
    pub months: Option<u32>,
    pub days: Option<u32>,
    /// Set when the latest submission was rejected
    pub errors: Option<ValidationErrors>,
}

impl AgeViewState {
    pub fn counter(&self, counter: Counter) -> Option<u32> {
        match counter {
            Counter::Years => self.years,
            Counter::Months => self.months,
            Counter::Days => self.days,
        }
    }

    fn counter_mut(&mut self, counter: Counter) -> &mut Option<u32> {
        match counter {
            Counter::Years => &mut self.years,
            Counter::Months => &mut self.months,
            Counter::Days => &mut self.days,
        }
    }

    /// No counter has a value
    pub fn is_empty(&self) -> bool {
        self.years.is_none() && self.months.is_none() && self.days.is_none()
    }

    /// One line of text, e.g. `24 years  2 months  - - days`, followed by
    /// the displayed errors if the last submission was rejected.
    pub fn render_line(&self) -> String {
        let show = |value: Option<u32>| value.map_or_else(|| EMPTY.to_string(), |v| v.to_string());
        let mut line = format!(
            "{} years  {} months  {} days",
            show(self.years),
            show(self.months),
            show(self.days)
        );
        if let Some(errors) = &self.errors {
            line.push_str(&format!("  ({errors})"));
        }
        line
    }
}

/// How a submission ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// All three counters reached the computed age
    Revealed(AgeComponents),
    /// A newer submission took over before the reveal finished
    Superseded(AgeComponents),
    Rejected(ValidationErrors),
}

#[derive(Debug, Clone)]
pub struct AgeView {
    state: Arc<watch::Sender<AgeViewState>>,
    config: Config,
}

impl AgeView {
    pub fn new(config: Config) -> Self {
        let (state, _) = watch::channel(AgeViewState::default());
        Self {
            state: Arc::new(state),
            config,
        }
    }

    /// Receives every state change; closes once the last `AgeView` clone is
    /// dropped.
    pub fn subscribe(&self) -> watch::Receiver<AgeViewState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> AgeViewState {
        self.state.borrow().clone()
    }

    /// Empties the counters and retires any running reveal.
    pub fn reset(&self) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = state.generation + 1;
            *state = AgeViewState {
                generation,
                ..AgeViewState::default()
            };
        });
        generation
    }

    /// Validates `input` and, if it is a real past date, reveals the age.
    ///
    /// Completes once all three counters have finished or been superseded.
    pub async fn submit(&self, input: &RawDateInput, today: NaiveDate) -> Submission {
        let generation = self.reset();
        debug!(generation, ?input, %today, "submission");

        let birthdate = match validate(input, today, self.config.min_year) {
            Ok(birthdate) => birthdate,
            Err(errors) => {
                debug!(generation, %errors, "submission rejected");
                self.state.send_if_modified(|state| {
                    if state.generation != generation {
                        return false;
                    }
                    state.errors = Some(errors.clone());
                    true
                });
                return Submission::Rejected(errors);
            }
        };

        let age = age_between(birthdate, today);
        debug!(generation, %birthdate, %age, "revealing age");

        let durations = self.config.reveal;
        let outcomes = tokio::join!(
            self.reveal_counter(generation, Counter::Years, age.years, durations.years),
            self.reveal_counter(generation, Counter::Months, age.months, durations.months),
            self.reveal_counter(generation, Counter::Days, age.days, durations.days),
        );

        let completed = RevealOutcome::Completed;
        if outcomes == (completed, completed, completed) {
            debug!(generation, "reveal finished");
            Submission::Revealed(age)
        } else {
            debug!(generation, "reveal superseded");
            Submission::Superseded(age)
        }
    }

    async fn reveal_counter(
        &self,
        generation: u64,
        counter: Counter,
        target: u32,
        duration: Duration,
    ) -> RevealOutcome {
        reveal(target, duration, |value| {
            let applied = self.state.send_if_modified(|state| {
                if state.generation != generation {
                    return false;
                }
                *state.counter_mut(counter) = Some(value);
                true
            });
            if applied {
                trace!(generation, ?counter, value, "tick");
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        })
        .await
    }
}
