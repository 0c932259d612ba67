use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChoreboardError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Not an assignee: {0}")]
    NotAssignee(String),
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),
    #[error("Weekly limit exceeded: {0}")]
    LimitExceeded(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}
