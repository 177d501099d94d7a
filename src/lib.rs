pub mod clock;
pub mod demos;
pub mod error;
pub mod executor;
pub mod logger;
pub mod markers;
pub mod output;
pub mod timer;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{Error, MarkerError, Result};
pub use executor::{new_executor_and_spawner, Executor, Spawner, TimeoutHandle, TimeoutState};
pub use markers::TimingMarkers;
pub use output::{MemoryOutput, Output, SharedOutput, Stdout};
