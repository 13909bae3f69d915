//! Unified application error type.
//! All modules (db, core, cli, utils) return AppError to keep the error
//! handling consistent and easy to manage.

use crate::core::recurrence::RecurrenceError;
use crate::core::validator::ValidationErrors;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// One row of a batch failed; nothing from the batch was kept.
    #[error("Batch insert failed at occurrence #{index}, no appointment was saved: {source}")]
    BatchInsert {
        index: usize,
        #[source]
        source: rusqlite::Error,
    },

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid appointment type: {0}")]
    InvalidType(String),

    #[error("Invalid appointment status: {0}")]
    InvalidStatus(String),

    #[error("Invalid weekday: {0}")]
    InvalidWeekday(String),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(#[from] serde_json::Error),

    // ---------------------------
    // Scheduling errors
    // ---------------------------
    #[error("Validation failed:\n{0}")]
    Validation(ValidationErrors),

    #[error("Recurrence error: {0}")]
    Recurrence(#[from] RecurrenceError),

    #[error("Overlap with existing appointments for {party}: {}", ids.join(", "))]
    Overlap { party: String, ids: Vec<String> },

    #[error("Appointment not found: {0}")]
    NotFound(String),

    #[error("Operation not allowed: {0}")]
    Forbidden(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("Export error: {0}")]
    Export(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

pub type AppResult<T> = Result<T, AppError>;
