use {
    crate::{
        clock::SharedClock,
        error::{Error, Result},
        timer::{TimerFuture, TimerQueue},
    },
    crossbeam_channel::{unbounded, Receiver, Sender},
    futures::{
        future::{BoxFuture, FutureExt},
        task::{waker_ref, ArcWake},
    },
    std::{
        future::Future,
        sync::{
            atomic::{AtomicBool, AtomicU64, Ordering},
            Arc, Mutex,
        },
        task::{Context, Poll},
        time::Duration,
    },
};

/// Runs every spawned task on the calling thread. Only one task is polled at
/// a time; timers fire only once no task is ready.
pub struct Executor {
    ready_queue: Receiver<Arc<Task>>,
    timers: Arc<TimerQueue>,
    clock: SharedClock,
}

#[derive(Clone)]
pub struct Spawner {
    task_sender: Sender<Arc<Task>>,
    timers: Arc<TimerQueue>,
    clock: SharedClock,
    next_timeout_id: Arc<AtomicU64>,
}

struct Task {
    future: Mutex<Option<BoxFuture<'static, ()>>>,
    task_sender: Sender<Arc<Task>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeoutId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutState {
    Pending,
    Fired,
}

/// Returned by [`Spawner::schedule_after`]. Observes the callback, cannot
/// cancel it.
#[derive(Debug, Clone)]
pub struct TimeoutHandle {
    id: TimeoutId,
    fired: Arc<AtomicBool>,
}

impl TimeoutHandle {
    pub fn id(&self) -> TimeoutId {
        self.id
    }

    pub fn state(&self) -> TimeoutState {
        if self.fired.load(Ordering::Acquire) {
            TimeoutState::Fired
        } else {
            TimeoutState::Pending
        }
    }
}

pub fn new_executor_and_spawner(clock: SharedClock) -> (Executor, Spawner) {
    let (task_sender, ready_queue) = unbounded();
    let timers = Arc::new(TimerQueue::new());
    (
        Executor {
            ready_queue,
            timers: timers.clone(),
            clock: clock.clone(),
        },
        Spawner {
            task_sender,
            timers,
            clock,
            next_timeout_id: Arc::new(AtomicU64::new(1)),
        },
    )
}

impl Spawner {
    pub fn spawn(&self, future: impl Future<Output = ()> + 'static + Send) -> Result<()> {
        let future = future.boxed();
        let task = Arc::new(Task {
            future: Mutex::new(Some(future)),
            task_sender: self.task_sender.clone(),
        });
        self.task_sender
            .send(task)
            .map_err(|_| Error::ExecutorGone)
    }

    /// A future that completes once `delay` has passed, counted from now
    /// rather than from the first poll.
    pub fn sleep(&self, delay: Duration) -> TimerFuture {
        TimerFuture::new(self.clock.now() + delay, &self.timers)
    }

    /// Runs `callback` on the executor no earlier than `delay` from now.
    /// Never blocks; each call gets its own firing.
    pub fn schedule_after<F>(&self, callback: F, delay: Duration) -> Result<TimeoutHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        let id = TimeoutId(self.next_timeout_id.fetch_add(1, Ordering::Relaxed));
        let fired = Arc::new(AtomicBool::new(false));
        let timer = self.sleep(delay);
        let task_fired = fired.clone();
        self.spawn(async move {
            timer.await;
            callback();
            task_fired.store(true, Ordering::Release);
        })?;
        tracing::debug!(id = id.0, ?delay, "callback scheduled");
        Ok(TimeoutHandle { id, fired })
    }
}

impl ArcWake for Task {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        let cloned = arc_self.clone();
        if arc_self.task_sender.send(cloned).is_err() {
            tracing::trace!("executor gone, dropping woken task");
        }
    }
}

impl Executor {
    /// Returns once no task is ready and no timer is pending. A task still
    /// waiting on anything other than a timer is abandoned at that point.
    pub fn run(&self) {
        loop {
            while let Ok(task) = self.ready_queue.try_recv() {
                self.poll_task(&task);
            }
            let Some(deadline) = self.timers.next_deadline() else {
                break;
            };
            self.clock.sleep_until(deadline);
            let fired = self.timers.fire_expired(self.clock.now());
            tracing::trace!(fired, "timers expired");
        }
        tracing::debug!("executor idle, run finished");
    }

    fn poll_task(&self, task: &Arc<Task>) {
        let mut future_slot = task.future.lock().unwrap();
        if let Some(mut future) = future_slot.take() {
            let waker = waker_ref(task);
            let context = &mut Context::from_waker(&*waker);
            if let Poll::Pending = future.as_mut().poll(context) {
                *future_slot = Some(future);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};

    fn manual() -> (Arc<ManualClock>, Executor, Spawner) {
        let clock = Arc::new(ManualClock::new());
        let (executor, spawner) = new_executor_and_spawner(clock.clone());
        (clock, executor, spawner)
    }

    #[test]
    fn test_sync_work_runs_before_callbacks() {
        let (_clock, executor, spawner) = manual();
        let log = Arc::new(Mutex::new(Vec::new()));

        let l = log.clone();
        spawner
            .schedule_after(move || l.lock().unwrap().push("timeout"), Duration::ZERO)
            .unwrap();
        let l = log.clone();
        spawner
            .spawn(async move { l.lock().unwrap().push("task") })
            .unwrap();
        log.lock().unwrap().push("sync");

        executor.run();
        assert_eq!(*log.lock().unwrap(), ["sync", "task", "timeout"]);
    }

    #[test]
    fn test_callbacks_fire_by_deadline() {
        let (clock, executor, spawner) = manual();
        let start = clock.now();
        let fired_at = Arc::new(Mutex::new(Vec::new()));

        for (name, ms) in [("slow", 300), ("fast", 100), ("fast-too", 100)] {
            let fired_at = fired_at.clone();
            let clock = clock.clone();
            spawner
                .schedule_after(
                    move || fired_at.lock().unwrap().push((name, clock.now() - start)),
                    Duration::from_millis(ms),
                )
                .unwrap();
        }
        executor.run();

        assert_eq!(
            *fired_at.lock().unwrap(),
            [
                ("fast", Duration::from_millis(100)),
                ("fast-too", Duration::from_millis(100)),
                ("slow", Duration::from_millis(300)),
            ]
        );
    }

    #[test]
    fn test_handle_state_and_ids() {
        let (_clock, executor, spawner) = manual();
        let a = spawner
            .schedule_after(|| {}, Duration::from_millis(10))
            .unwrap();
        let b = spawner
            .schedule_after(|| {}, Duration::from_millis(10))
            .unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.state(), TimeoutState::Pending);

        executor.run();
        assert_eq!(a.state(), TimeoutState::Fired);
        assert_eq!(b.state(), TimeoutState::Fired);
    }

    #[test]
    fn test_callback_can_schedule_more() {
        let (clock, executor, spawner) = manual();
        let count = Arc::new(AtomicU64::new(0));

        let inner_spawner = spawner.clone();
        let c = count.clone();
        spawner
            .schedule_after(
                move || {
                    c.fetch_add(1, Ordering::Relaxed);
                    let c = c.clone();
                    inner_spawner
                        .schedule_after(
                            move || {
                                c.fetch_add(1, Ordering::Relaxed);
                            },
                            Duration::from_millis(50),
                        )
                        .unwrap();
                },
                Duration::from_millis(50),
            )
            .unwrap();
        executor.run();

        assert_eq!(count.load(Ordering::Relaxed), 2);
        assert_eq!(clock.elapsed(), Duration::from_millis(100));
    }

    #[test]
    fn test_spawn_after_executor_dropped() {
        let (_clock, executor, spawner) = manual();
        drop(executor);
        assert!(matches!(
            spawner.spawn(async {}),
            Err(Error::ExecutorGone)
        ));
    }

    #[test]
    fn test_dropped_sleep_does_not_hold_run() {
        let (clock, executor, spawner) = manual();
        let sleep = spawner.sleep(Duration::from_secs(3600));
        drop(sleep);

        executor.run();
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }
}
