use std::sync::Arc;

use deferred_demos::{demos::deferred_log, logger, Stdout, SystemClock};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logger::init_logger();
    deferred_log::run_program(Arc::new(SystemClock), Arc::new(Stdout))?;
    Ok(())
}
