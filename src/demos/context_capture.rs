use std::{sync::Arc, time::Duration};

use crate::{
    clock::SharedClock,
    demos::DEFAULT_DELAY,
    error::Result,
    executor::{new_executor_and_spawner, Spawner, TimeoutHandle},
    output::{Output, SharedOutput},
};

pub fn print_name(out: &dyn Output, name: &str) {
    out.emit(&format!("My name is {name}"));
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dog {
    name: String,
}

impl Dog {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { name: name.into() })
    }

    /// Prints this dog's name after `delay`. The callback owns its own
    /// reference to the dog, taken here. A callback that instead looked up
    /// its receiver when the timer fires would have no dog to read and would
    /// print `My name is undefined`.
    pub fn print_name_after_time(
        self: &Arc<Self>,
        spawner: &Spawner,
        out: SharedOutput,
        delay: Duration,
    ) -> Result<TimeoutHandle> {
        let dog = Arc::clone(self);
        spawner.schedule_after(move || print_name(out.as_ref(), &dog.name), delay)
    }
}

/// Prints `Shigeta` right away and schedules `Taro` to print after `delay`.
pub fn run(spawner: &Spawner, out: SharedOutput, delay: Duration) -> Result<TimeoutHandle> {
    print_name(out.as_ref(), "Shigeta");
    let dog = Dog::new("Taro");
    dog.print_name_after_time(spawner, out, delay)
}

/// The whole program with the fixed one second delay.
pub fn run_program(clock: SharedClock, out: SharedOutput) -> Result<()> {
    let (executor, spawner) = new_executor_and_spawner(clock);
    run(&spawner, out, DEFAULT_DELAY)?;
    drop(spawner);
    executor.run();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock, executor::new_executor_and_spawner, output::MemoryOutput,
    };

    #[test]
    fn test_print_name() {
        let out = MemoryOutput::new();
        print_name(&out, "Shigeta");
        assert_eq!(out.lines(), ["My name is Shigeta"]);
    }

    #[test]
    fn test_callback_outlives_caller_reference() {
        let (executor, spawner) = new_executor_and_spawner(Arc::new(ManualClock::new()));
        let out = MemoryOutput::new();

        let dog = Dog::new("Pochi");
        dog.print_name_after_time(&spawner, Arc::new(out.clone()), Duration::from_millis(5))
            .unwrap();
        assert_eq!(Arc::strong_count(&dog), 2);
        drop(dog);

        executor.run();
        assert_eq!(out.lines(), ["My name is Pochi"]);
    }
}
