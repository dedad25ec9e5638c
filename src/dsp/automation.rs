#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Parameter Automation
====================

An automatable parameter is a default value plus a time-ordered list of
events. Times are absolute clock seconds.

  SetValue { time, value }         jump to value at time
  LinearRamp { end, value }        straight line from the previous event
  ExponentialRamp { end, value }   constant ratio per unit time from the
                                   previous event

A ramp starts where the event before it ends (its time and value). With no
previous event it starts at time 0 from the default value. Once the last
event has passed, its value holds forever.

Exponential ramps interpolate as v0 * (v1 / v0)^((t - t0) / (t1 - t0)), which
is undefined when v0 is 0 or the two values have opposite signs. In that case
the previous value holds until the ramp's end time and then jumps. This is
why envelopes use a small floor instead of 0.

Events are added in the control domain (may allocate). Evaluation through
`next_value` is O(1) amortized for monotonic time and never allocates.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutomationEvent {
    SetValue { time: f64, value: f32 },
    LinearRamp { end: f64, value: f32 },
    ExponentialRamp { end: f64, value: f32 },
}

impl AutomationEvent {
    /// Time at which the event's value is reached.
    pub fn time(&self) -> f64 {
        match *self {
            AutomationEvent::SetValue { time, .. } => time,
            AutomationEvent::LinearRamp { end, .. } => end,
            AutomationEvent::ExponentialRamp { end, .. } => end,
        }
    }

    pub fn value(&self) -> f32 {
        match *self {
            AutomationEvent::SetValue { value, .. }
            | AutomationEvent::LinearRamp { value, .. }
            | AutomationEvent::ExponentialRamp { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Automation {
    default_value: f32,
    events: Vec<AutomationEvent>,
    cursor: usize,
}

impl Automation {
    pub fn new(default_value: f32) -> Self {
        Self {
            default_value,
            events: Vec::new(),
            cursor: 0,
        }
    }

    pub fn default_value(&self) -> f32 {
        self.default_value
    }

    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    /// Insert an event, after any existing events at the same time.
    pub fn push(&mut self, event: AutomationEvent) {
        let at = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(at, event);
        self.cursor = 0;
    }

    /// Time of the last event, if any.
    pub fn end_time(&self) -> Option<f64> {
        self.events.last().map(AutomationEvent::time)
    }

    /// Value at absolute time `t`.
    pub fn value_at(&self, t: f64) -> f32 {
        let index = self.events.partition_point(|e| e.time() <= t);
        self.evaluate(index, t)
    }

    /// Value at `t` for monotonically increasing `t` (render path).
    #[inline]
    pub fn next_value(&mut self, t: f64) -> f32 {
        if self.cursor > 0 && self.events[self.cursor - 1].time() > t {
            self.cursor = 0;
        }
        while self.cursor < self.events.len() && self.events[self.cursor].time() <= t {
            self.cursor += 1;
        }
        self.evaluate(self.cursor, t)
    }

    /// `index` is the number of events at or before `t`.
    #[inline]
    fn evaluate(&self, index: usize, t: f64) -> f32 {
        let (t0, v0) = match index.checked_sub(1) {
            Some(prev) => (self.events[prev].time(), self.events[prev].value()),
            None => (0.0, self.default_value),
        };

        let Some(next) = self.events.get(index) else {
            return v0;
        };

        match *next {
            AutomationEvent::SetValue { .. } => v0,
            AutomationEvent::LinearRamp { end, value } => {
                let progress = ramp_progress(t0, end, t);
                v0 + (value - v0) * progress
            }
            AutomationEvent::ExponentialRamp { end, value } => {
                if v0 == 0.0 || (v0 < 0.0) != (value < 0.0) {
                    return v0;
                }
                let progress = ramp_progress(t0, end, t);
                v0 * (value / v0).powf(progress)
            }
        }
    }
}

#[inline]
fn ramp_progress(t0: f64, t1: f64, t: f64) -> f32 {
    if t1 <= t0 {
        return 1.0;
    }
    ((t - t0) / (t1 - t0)).clamp(0.0, 1.0) as f32
}
