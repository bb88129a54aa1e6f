//! Unified application error model and mapping helpers.
//! This module provides a common error enum used across the parser, executor
//! and storage engine, along with the mapping to the numeric response codes
//! exposed on `ParserResponse`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DbError {
    Parse { message: String },
    TableNotFound { message: String },
    ColumnNotFound { message: String },
    Engine { message: String },
    Io { message: String },
    Internal { message: String },
}

impl DbError {
    pub fn code_str(&self) -> &'static str {
        match self {
            DbError::Parse { .. } => "parse_error",
            DbError::TableNotFound { .. } => "table_not_found",
            DbError::ColumnNotFound { .. } => "column_not_found",
            DbError::Engine { .. } => "engine_error",
            DbError::Io { .. } => "io_error",
            DbError::Internal { .. } => "internal_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            DbError::Parse { message }
            | DbError::TableNotFound { message }
            | DbError::ColumnNotFound { message }
            | DbError::Engine { message }
            | DbError::Io { message }
            | DbError::Internal { message } => message.as_str(),
        }
    }

    pub fn parse<S: Into<String>>(msg: S) -> Self { DbError::Parse { message: msg.into() } }
    pub fn table_not_found<S: Into<String>>(msg: S) -> Self { DbError::TableNotFound { message: msg.into() } }
    pub fn column_not_found<S: Into<String>>(msg: S) -> Self { DbError::ColumnNotFound { message: msg.into() } }
    pub fn engine<S: Into<String>>(msg: S) -> Self { DbError::Engine { message: msg.into() } }
    pub fn io<S: Into<String>>(msg: S) -> Self { DbError::Io { message: msg.into() } }
    pub fn internal<S: Into<String>>(msg: S) -> Self { DbError::Internal { message: msg.into() } }

    /// Map to the HTTP-like response code carried by `ParserResponse`.
    /// 200 is reserved for success and never produced here.
    pub fn response_code(&self) -> u16 {
        match self {
            DbError::Parse { .. } => 400,
            DbError::TableNotFound { .. } => 404,
            DbError::ColumnNotFound { .. } => 404,
            DbError::Engine { .. } => 422,
            DbError::Io { .. } => 503,
            DbError::Internal { .. } => 500,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for DbError {}

pub type DbResult<T> = Result<T, DbError>;

impl From<anyhow::Error> for DbError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: treat as Engine unless downcasted elsewhere
        DbError::Engine { message: err.to_string() }
    }
}

impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        DbError::Io { message: err.to_string() }
    }
}
