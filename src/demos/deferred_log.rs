use std::{sync::Arc, time::Duration};

use crate::{
    clock::SharedClock,
    demos::DEFAULT_DELAY,
    error::Result,
    executor::{new_executor_and_spawner, Spawner, TimeoutHandle},
    markers::TimingMarkers,
    output::SharedOutput,
};

pub const LABEL: &str = "function xyz";

/// Starts the `function xyz` marker, then schedules a callback that prints
/// `print first` before reporting the elapsed time under the same label.
pub fn run(
    spawner: &Spawner,
    markers: Arc<TimingMarkers>,
    out: SharedOutput,
    delay: Duration,
) -> Result<TimeoutHandle> {
    markers.mark_start(LABEL)?;
    spawner.schedule_after(
        move || {
            out.emit("print first");
            if let Err(e) = markers.report_elapsed(LABEL) {
                tracing::warn!("{e}");
            }
        },
        delay,
    )
}

/// The whole program: schedules with the fixed one second delay and runs the
/// executor until the callback has fired.
pub fn run_program(clock: SharedClock, out: SharedOutput) -> Result<()> {
    let markers = Arc::new(TimingMarkers::new(clock.clone(), out.clone()));
    let (executor, spawner) = new_executor_and_spawner(clock);
    run(&spawner, markers, out, DEFAULT_DELAY)?;
    drop(spawner);
    executor.run();
    Ok(())
}
