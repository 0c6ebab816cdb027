use crate::domain::model::Unit;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoundingError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid date: {unit} = {value} ({reason})")]
    InvalidDate {
        unit: Unit,
        value: i64,
        reason: String,
    },

    #[error("Could not parse '{value}' as a date-time")]
    TimestampParse { value: String },

    #[error("Field '{field}' not found (available: {available})")]
    FieldNotFound { field: String, available: String },

    #[error("Duplicate row key '{key}'")]
    DuplicateRowKey { key: String },

    #[error("Row {key} aborted the run: {source}")]
    RowAborted {
        key: String,
        #[source]
        source: Box<RoundingError>,
    },

    #[error("Invalid configuration value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Schema,
    Data,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RoundingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfigValueError { .. } | Self::ConfigValidationError { .. } => {
                ErrorCategory::Configuration
            }
            Self::FieldNotFound { .. } | Self::DuplicateRowKey { .. } => ErrorCategory::Schema,
            Self::InvalidDate { .. } | Self::TimestampParse { .. } | Self::RowAborted { .. } => {
                ErrorCategory::Data
            }
            Self::CsvError(_) | Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Io,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // a single bad row is recoverable unless the run was told to abort on it
            Self::InvalidDate { .. } | Self::TimestampParse { .. } => ErrorSeverity::Medium,
            Self::RowAborted { .. } => ErrorSeverity::High,
            Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. }
            | Self::FieldNotFound { .. }
            | Self::DuplicateRowKey { .. } => ErrorSeverity::High,
            Self::CsvError(_) | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    /// Whether the error only concerns a single row.
    pub fn is_row_level(&self) -> bool {
        matches!(self, Self::InvalidDate { .. } | Self::TimestampParse { .. })
    }

    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Schema => 1,
            ErrorCategory::Data => 2,
            ErrorCategory::Io => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::InvalidDate { unit, .. } => format!(
                "Check the --{} override; the resulting date must exist in the calendar",
                unit
            ),
            Self::TimestampParse { .. } => {
                "Add a matching --input-format (chrono strftime syntax)".to_string()
            }
            Self::FieldNotFound { .. } => {
                "Field names are case-sensitive; check the table header row".to_string()
            }
            Self::DuplicateRowKey { .. } => {
                "Choose an object-id field with unique values, or omit --oid-field".to_string()
            }
            Self::RowAborted { .. } => {
                "Fix the offending row or rerun with --on-row-error skip".to_string()
            }
            Self::InvalidConfigValueError { field, .. }
            | Self::ConfigValidationError { field, .. } => {
                format!("Correct the value of {}", field)
            }
            Self::CsvError(_) => {
                "Check the table delimiter and that every row has the header's column count"
                    .to_string()
            }
            Self::IoError(_) => "Check that the table path exists and is writable".to_string(),
            Self::SerializationError(_) => "Rerun without --summary-json".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Schema => format!("Table schema problem: {}", self),
            ErrorCategory::Data => format!("Could not round date-time values: {}", self),
            ErrorCategory::Io => format!("Could not read or write the table: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, RoundingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_level_errors_are_medium_severity() {
        let err = RoundingError::InvalidDate {
            unit: Unit::Day,
            value: 30,
            reason: "February 2016 has 29 days".to_string(),
        };
        assert!(err.is_row_level());
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.category(), ErrorCategory::Data);
        assert!(err.to_string().contains("day = 30"));
    }

    #[test]
    fn test_exit_codes_follow_category() {
        let missing = RoundingError::FieldNotFound {
            field: "REPORTED".to_string(),
            available: "OBJECTID".to_string(),
        };
        assert_eq!(missing.exit_code(), 1);
        assert!(!missing.is_row_level());

        let aborted = RoundingError::RowAborted {
            key: "7".to_string(),
            source: Box::new(RoundingError::TimestampParse {
                value: "yesterday".to_string(),
            }),
        };
        assert_eq!(aborted.exit_code(), 2);

        let io = RoundingError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        assert_eq!(io.exit_code(), 3);
    }
}
