pub mod context_capture;
pub mod deferred_log;

use std::time::Duration;

/// Delay both examples wait before their callback runs.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);
