use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FitgrepError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Directory walk error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Query can not be compiled: {query}: {source}")]
    QueryCompile {
        query: String,
        #[source]
        source: regex::Error,
    },

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Search task failed: {0}")]
    TaskFailed(String),

    #[error("A search can only be submitted from within a Tokio runtime")]
    NoRuntime,

    #[error("An unexpected error occurred: {0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FitgrepError>;
