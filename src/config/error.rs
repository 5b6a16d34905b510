use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}. Please set them in your .env file.", .0.join(", "))]
    MissingVariables(Vec<String>),
    #[error("Invalid value for {name}: `{value}`")]
    InvalidValue { name: String, value: String },
    #[error("Invalid SEND_AT format: `{0}`. Use 'HH:MM' for today or 'YYYY-MM-DD HH:MM' for a specific date")]
    InvalidSchedule(String),
}
