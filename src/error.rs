use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkerError {
    #[error("Label '{0}' already exists")]
    AlreadyStarted(String),

    #[error("No such label '{0}'")]
    NotStarted(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Timing marker error: {0}")]
    Marker(#[from] MarkerError),

    #[error("Executor has been dropped, task not scheduled")]
    ExecutorGone,
}

pub type Result<T> = std::result::Result<T, Error>;
