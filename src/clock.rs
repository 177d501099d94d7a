use std::{
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

/// Time source shared by the executor and the timing markers.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    /// Block the calling thread until `deadline` has passed.
    fn sleep_until(&self, deadline: Instant);
}

pub type SharedClock = Arc<dyn Clock>;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until(&self, deadline: Instant) {
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
    }
}

/// A clock that only moves when told to. `sleep_until` jumps straight to the
/// deadline, so a whole executor run completes without waiting.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap()
    }

    fn sleep_until(&self, deadline: Instant) {
        let target = deadline.saturating_duration_since(self.origin);
        let mut offset = self.offset.lock().unwrap();
        if target > *offset {
            *offset = target;
        }
    }
}

#[test]
fn test_manual_clock_never_goes_back() {
    let clock = ManualClock::new();
    let start = clock.now();
    clock.sleep_until(start + Duration::from_millis(500));
    assert_eq!(clock.elapsed(), Duration::from_millis(500));

    clock.sleep_until(start + Duration::from_millis(100));
    assert_eq!(clock.now() - start, Duration::from_millis(500));

    clock.advance(Duration::from_millis(250));
    assert_eq!(clock.elapsed(), Duration::from_millis(750));
}

#[test]
fn test_system_clock_sleeps_past_deadline() {
    let clock = SystemClock;
    let deadline = clock.now() + Duration::from_millis(10);
    clock.sleep_until(deadline);
    assert!(clock.now() >= deadline);
}
