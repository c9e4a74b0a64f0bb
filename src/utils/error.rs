use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Cannot read input '{path}': {message}")]
    Input { path: String, message: String },

    #[error("Unsupported input encoding: {label}")]
    UnsupportedEncoding { label: String },

    #[error("Template '{name}' is invalid: {message}")]
    Template { name: String, message: String },

    #[error("Field '{field}' is referenced by the template but missing from the record")]
    MissingField { field: String },

    #[error("Record is not a valid mapping: {message}")]
    RecordParse { message: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ConvertError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ConvertError::MissingField { .. }
            | ConvertError::RecordParse { .. }
            | ConvertError::Yaml(_) => ErrorSeverity::Medium,
            ConvertError::Input { .. }
            | ConvertError::Csv(_)
            | ConvertError::Json(_)
            | ConvertError::UnsupportedEncoding { .. }
            | ConvertError::Template { .. }
            | ConvertError::Config { .. }
            | ConvertError::InvalidConfigValue { .. }
            | ConvertError::MissingConfig { .. } => ErrorSeverity::High,
            ConvertError::Io(_) => ErrorSeverity::Critical,
        }
    }

    /// 給操作人員的修復建議
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ConvertError::Input { .. } => "Check that the input file exists and is a delimited file with a header row",
            ConvertError::UnsupportedEncoding { .. } => {
                "Use a WHATWG encoding label such as utf-8 or windows-1252"
            }
            ConvertError::Template { .. } => {
                "Check the template path and that every '{{' has a matching '}}'"
            }
            ConvertError::MissingField { .. } => {
                "Fix the placeholder name or switch missing_field to 'empty'"
            }
            ConvertError::RecordParse { .. } | ConvertError::Yaml(_) => {
                "Quote values in the template that contain ':' or '#'"
            }
            ConvertError::Csv(_) => "Check the delimiter and quoting of the input file",
            ConvertError::Io(_) => "Check file permissions and free disk space",
            ConvertError::Json(_) => "Nested values must use string keys",
            ConvertError::Config { .. }
            | ConvertError::InvalidConfigValue { .. }
            | ConvertError::MissingConfig { .. } => "Review the configuration file or CLI flags",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ConvertError::Input { path, .. } => format!("Could not load supplier file {}", path),
            ConvertError::MissingField { field } => {
                format!("The template needs a column named '{}'", field)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
