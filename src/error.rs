use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("File could not be read or written: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid scheduling input: {0}")]
    InvalidInput(String),
}

impl From<calamine::Error> for ScheduleError {
    fn from(e: calamine::Error) -> Self {
        ScheduleError::Workbook(e.to_string())
    }
}

impl From<calamine::XlsxError> for ScheduleError {
    fn from(e: calamine::XlsxError) -> Self {
        ScheduleError::Workbook(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
