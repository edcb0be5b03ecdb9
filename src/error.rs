use thiserror::Error as ThisError;

pub use anyhow::Context;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("not a valid ticker argument")]
    InvalidTicker,
    #[error("not a valid source argument")]
    InvalidSource,
    #[error("missing request argument: {0}")]
    MissingArgument(&'static str),
    #[error("missing aggregates API key")]
    MissingApiKey,
    #[error("bar interval not supported by the quote provider")]
    InvalidInterval,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Chrono(#[from] chrono::ParseError),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn message<T: Into<String>>(msg: T) -> Self {
        Error::Message(msg.into())
    }
}
