use crate::types::DivisionId;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("At least 2 teams are required to generate fixtures, got {0}")]
    InsufficientEntities(usize),
    #[error("Team at position {0} appears more than once")]
    DuplicateEntity(usize),
    #[error("Degenerate configuration: {0}")]
    DegenerateConfiguration(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid match: {0}")]
    InvalidMatch(String),
    #[error("Other error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error("Failed to store fixtures for division {division_id}: {source}")]
    Storage {
        division_id: DivisionId,
        #[source]
        source: RepositoryError,
    },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid slot time '{0}', expected HH:MM")]
    InvalidSlot(String),
    #[error("Invalid scan order '{0}', expected 'tail' or 'head'")]
    InvalidScanOrder(String),
    #[error("No slot times given")]
    EmptySlotList,
}
