use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("unknown source id: {0}")]
    UnknownSource(String),
}
