//! Start-up and storage errors
//!
//! Request-level failures are modelled in the web crate. The types here cover
//! what stops the service from starting or from reaching its records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type RosterResult<T> = Result<T, RosterError>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Where and when an error was raised, plus hints for the operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Correlates the log line with the error returned to the caller
    pub error_id: String,
    pub timestamp: DateTime<Utc>,
    pub component: String,
    pub operation: Option<String>,
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while loading configuration or opening the record store
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxedSource>,
        context: ErrorContext,
    },

    /// A single setting holds a value the service cannot run with
    #[error("Invalid setting {field}: {message}")]
    Validation {
        message: String,
        field: String,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<BoxedSource>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RosterError {
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            RosterError::Config { context, .. }
            | RosterError::Validation { context, .. }
            | RosterError::Storage { context, .. } => Some(context),
            RosterError::Io(_) => None,
        }
    }

    /// Storage and IO failures may clear up on retry; bad configuration never does
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RosterError::Storage { .. } | RosterError::Io(_))
    }

    pub fn log(&self) {
        let context = self.context();
        let error_id = context.map(|c| c.error_id.as_str());
        let operation = context.and_then(|c| c.operation.as_deref());

        if self.is_recoverable() {
            warn!(error_id, operation, error = %self, "Storage failure");
        } else {
            error!(error_id, error = %self, "Invalid configuration");
        }
    }
}

/// Failures reported by a record store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique column already holds this value
    #[error("duplicate value for unique field '{field}'")]
    Duplicate { field: String },

    /// The backing store could not be reached or the query failed
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<StoreError> for RosterError {
    fn from(error: StoreError) -> Self {
        RosterError::Storage {
            message: error.to_string(),
            source: Some(Box::new(error)),
            context: ErrorContext::new("store"),
        }
    }
}

/// `config_error!(message, component [, source])`
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::RosterError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check roster.toml and ROSTER__* environment variables"),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::RosterError::Config {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check roster.toml and ROSTER__* environment variables"),
        }
    };
}

/// `validation_error!(message, field, component)`
#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::RosterError::Validation {
            message: $msg.to_string(),
            field: $field.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion(&format!("Fix the value of {}", $field)),
        }
    };
}

/// `storage_error!(component, operation, message, source)`
#[macro_export]
macro_rules! storage_error {
    ($component:expr, $operation:expr, $msg:expr, $source:expr) => {
        $crate::RosterError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component)
                .with_operation($operation)
                .with_suggestion("Check the database URL and file permissions"),
        }
    };
}
