//! Performance measurement tools.

use std::{
    cell::Cell,
    fmt,
    time::{Duration, Instant},
};

use itertools::Itertools;

/// A timer that measures and averages the time an operation takes.
///
/// The recorded timings are averaged and reset when the timer is displayed via `{}`
/// ([`std::fmt::Display`]).
pub struct Timer {
    name: &'static str,
    nanos: Cell<u64>,
    samples: Cell<u32>,
}

impl Timer {
    /// Creates a new timer.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            nanos: Cell::new(0),
            samples: Cell::new(0),
        }
    }

    /// Invokes a closure, measuring and recording the time it takes.
    pub fn time<T>(&self, op: impl FnOnce() -> T) -> T {
        let _guard = self.start();
        op()
    }

    /// Starts timing an operation using a drop guard.
    ///
    /// When the returned [`TimerGuard`] is dropped, the time between the call to `start` and the
    /// drop is recorded.
    pub fn start(&self) -> TimerGuard<'_> {
        TimerGuard {
            start: Instant::now(),
            timer: self,
        }
    }

    fn record(&self, duration: Duration) {
        let nanos = duration.as_nanos().min(u128::from(u64::MAX)) as u64;
        self.nanos.set(self.nanos.get().saturating_add(nanos));
        self.samples.set(self.samples.get().saturating_add(1));
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let samples = self.samples.replace(0);
        let nanos = self.nanos.replace(0);
        if samples == 0 {
            write!(f, "{}: -", self.name)
        } else {
            let avg_ms = nanos as f64 / f64::from(samples) / 1_000_000.0;
            write!(f, "{}: {samples}x{avg_ms:.01}ms", self.name)
        }
    }
}

/// Guard returned by [`Timer::start`]. Stops timing the operation when dropped.
pub struct TimerGuard<'a> {
    start: Instant,
    timer: &'a Timer,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.timer.record(self.start.elapsed());
    }
}

/// Counts frames per second and periodically logs the rate, with optional extra data.
pub struct FpsCounter {
    name: String,
    frames: u32,
    start: Instant,
}

impl FpsCounter {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            frames: 0,
            start: Instant::now(),
        }
    }

    /// Advances the frame counter by 1, logging the frame rate every second.
    pub fn tick(&mut self) {
        self.tick_with(std::iter::empty::<&Timer>());
    }

    /// Advances the frame counter by 1, logging the frame rate and `extra` data every second.
    pub fn tick_with<D: fmt::Display>(&mut self, extra: impl IntoIterator<Item = D>) {
        self.frames += 1;
        if self.start.elapsed() < Duration::from_secs(1) {
            return;
        }

        let extra = extra.into_iter().map(|d| d.to_string()).join(", ");
        if extra.is_empty() {
            log::debug!("{}: {} FPS", self.name, self.frames);
        } else {
            log::debug!("{}: {} FPS ({extra})", self.name, self.frames);
        }
        self.frames = 0;
        self.start = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_resets() {
        let timer = Timer::new("op");
        assert_eq!(timer.to_string(), "op: -");

        timer.time(|| {});
        timer.time(|| {});
        assert_eq!(timer.samples.get(), 2);
        assert!(timer.to_string().starts_with("op: 2x"));
        assert_eq!(timer.to_string(), "op: -");
    }

    #[test]
    fn test_guard_records_on_drop() {
        let timer = Timer::new("op");
        {
            let _guard = timer.start();
            assert_eq!(timer.samples.get(), 0);
        }
        assert_eq!(timer.samples.get(), 1);
    }
}
