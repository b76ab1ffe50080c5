use std::time::Instant;

/// Monotonic time source, seconds since start.
pub trait Clock {
    fn now(&self) -> f64;
}

pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

// Shared handle so a test can keep moving time after giving the clock away.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct ManualClock(std::rc::Rc<std::cell::Cell<f64>>);

#[cfg(test)]
impl ManualClock {
    pub fn at(t: f64) -> Self {
        let clock = Self::default();
        clock.set(t);
        clock
    }

    pub fn set(&self, t: f64) {
        self.0.set(t);
    }

    pub fn advance(&self, dt: f64) {
        self.0.set(self.0.get() + dt);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.0.get()
    }
}
