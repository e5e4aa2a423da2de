use std::time::Duration;

/// Converts variable frame deltas into a whole number of fixed-period ticks.
///
/// Leftover time carries over to the next call. A long stall is capped at
/// `max_catch_up` ticks and the rest of the backlog is dropped.
#[derive(Clone, Debug)]
pub struct FixedTicker {
    period_sec: f64,
    accum: f64,
    max_catch_up: u32,
}

impl FixedTicker {
    pub fn new(hz: f32) -> Self {
        Self {
            period_sec: 1.0 / hz.max(f32::EPSILON) as f64,
            accum: 0.0,
            max_catch_up: 8,
        }
    }

    pub fn with_max_catch_up(mut self, ticks: u32) -> Self {
        self.max_catch_up = ticks.max(1);
        self
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(self.period_sec)
    }

    pub fn advance(&mut self, dt: Duration) -> u32 {
        self.accum += dt.as_secs_f64();
        let mut ticks = 0;
        while self.accum >= self.period_sec {
            self.accum -= self.period_sec;
            ticks += 1;
            if ticks == self.max_catch_up {
                self.accum = self.accum.min(self.period_sec);
                break;
            }
        }
        ticks
    }
}
