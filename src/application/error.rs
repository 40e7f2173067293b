use thiserror::Error;

use crate::domain::ExpenseId;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Username already registered: {0}")]
    DuplicateUsername(String),

    /// Deliberately says nothing about which check failed.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Deliberately says nothing about whether the token ever existed.
    #[error("Invalid session")]
    InvalidSession,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Expense not found: {0}")]
    NotFound(ExpenseId),

    #[error("Password hashing failed: {0}")]
    PasswordHashing(String),

    #[error("Database error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(reason: impl Into<String>) -> Self {
        AppError::Validation(reason.into())
    }

    /// Stable machine-readable code for transports to map onto their own
    /// status codes.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DuplicateUsername(_) => "duplicate_username",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidSession => "invalid_session",
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::PasswordHashing(_) | AppError::Storage(_) => "internal_error",
        }
    }
}
