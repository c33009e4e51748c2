use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecoError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid course '{code}': {reason}")]
    InvalidCourse { code: String, reason: String },

    #[error("Duplicate course code: {code}")]
    DuplicateCourse { code: String },

    #[error("Unknown course code: {code}")]
    UnknownCourse { code: String },

    #[error("Catalogue source error: {message}")]
    CatalogueSource { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfig { field: String },

    #[error("Invalid configuration value for '{field}' ('{value}'): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Data,
    Network,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code for a run that failed with this severity.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl RecoError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RecoError::IoError(_) => ErrorCategory::Io,
            RecoError::HttpError(_) | RecoError::CatalogueSource { .. } => ErrorCategory::Network,
            RecoError::TomlError(_)
            | RecoError::MissingConfig { .. }
            | RecoError::InvalidConfigValue { .. } => ErrorCategory::Configuration,
            RecoError::SerializationError(_)
            | RecoError::CsvError(_)
            | RecoError::InvalidCourse { .. }
            | RecoError::DuplicateCourse { .. }
            | RecoError::UnknownCourse { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // a remote catalogue may come back on retry
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            RecoError::IoError(_) => "Check that the file exists and the process can read/write it",
            RecoError::SerializationError(_) => "Make sure the input is valid JSON with the expected fields",
            RecoError::CsvError(_) => "Check the CSV header row and the column count of each line",
            RecoError::HttpError(_) | RecoError::CatalogueSource { .. } => {
                "Check the catalogue endpoint URL and that the service is reachable"
            }
            RecoError::TomlError(_) => "Make sure the configuration file is valid TOML",
            RecoError::InvalidCourse { .. } | RecoError::DuplicateCourse { .. } => {
                "Fix the offending course record in the catalogue"
            }
            RecoError::UnknownCourse { .. } => "Only reference course codes present in the catalogue",
            RecoError::MissingConfig { .. } => "Add the missing field to the configuration",
            RecoError::InvalidConfigValue { .. } => "Correct the configuration value and run again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Io => format!("File access failed: {}", self),
            ErrorCategory::Data => format!("Course data problem: {}", self),
            ErrorCategory::Network => format!("Could not fetch the catalogue: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, RecoError>;
