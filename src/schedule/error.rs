use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("The scheduled wait has been cancelled before the start time.")]
    Cancelled,
}
