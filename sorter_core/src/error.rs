use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SorterError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("control loop is not running")]
    LoopStopped,
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing plastic flap servo")]
    MissingPlasticFlap,
    #[error("missing paper flap servo")]
    MissingPaperFlap,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

/// Best-effort typed view of a report, for replying across the command queue.
pub(crate) fn as_sorter_error(e: &Report) -> SorterError {
    if let Some(se) = e.downcast_ref::<SorterError>() {
        return se.clone();
    }
    SorterError::State(format!("{e:#}"))
}
