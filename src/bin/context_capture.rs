use std::sync::Arc;

use deferred_demos::{demos::context_capture, logger, Stdout, SystemClock};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logger::init_logger();
    context_capture::run_program(Arc::new(SystemClock), Arc::new(Stdout))?;
    Ok(())
}
