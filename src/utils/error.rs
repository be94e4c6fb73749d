use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Malformed artifact '{artifact}': {reason}")]
    MalformedArtifact { artifact: String, reason: String },

    #[error("Incomplete generation: expected {expected} artifacts, found {found}")]
    IncompleteGeneration { expected: usize, found: usize },

    #[error("Path collision: '{path}' was computed for more than one artifact")]
    PathCollision { path: String },

    #[error("Archive write failed: {message}")]
    ArchiveWriteError { message: String },

    #[error("Generation service error during {stage}: {message}")]
    GenerationError { stage: String, message: String },

    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

// zip 只在封裝階段出現，一律視為封裝失敗
impl From<zip::result::ZipError> for CodegenError {
    fn from(err: zip::result::ZipError) -> Self {
        CodegenError::ArchiveWriteError {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Generation,
    Artifact,
    Archive,
    Input,
    Configuration,
    Network,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CodegenError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CodegenError::IncompleteGeneration { .. } | CodegenError::GenerationError { .. } => {
                ErrorCategory::Generation
            }
            CodegenError::MalformedArtifact { .. } | CodegenError::PathCollision { .. } => {
                ErrorCategory::Artifact
            }
            CodegenError::ArchiveWriteError { .. } => ErrorCategory::Archive,
            CodegenError::InvalidSchema { .. } | CodegenError::SerializationError(_) => {
                ErrorCategory::Input
            }
            CodegenError::ApiError(_) => ErrorCategory::Network,
            CodegenError::IoError(_) => ErrorCategory::System,
            CodegenError::ConfigError { .. }
            | CodegenError::ConfigValidationError { .. }
            | CodegenError::InvalidConfigValueError { .. }
            | CodegenError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 重新送出請求即可能成功
            ErrorCategory::Generation | ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Artifact | ErrorCategory::Input | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::Archive | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 是否值得由呼叫端重新送出整個請求（管線本身從不重試）
    pub fn is_retryable(&self) -> bool {
        self.severity() == ErrorSeverity::Medium
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CodegenError::IncompleteGeneration { .. } => {
                "Generation failed, retry the request.".to_string()
            }
            CodegenError::GenerationError { stage, .. } => {
                format!("The text generation service failed while producing the {}.", stage)
            }
            CodegenError::MalformedArtifact { artifact, .. } => format!(
                "The generated {} could not be placed in the project tree.",
                artifact
            ),
            CodegenError::PathCollision { path } => {
                format!("Two generated files resolved to the same path: {}", path)
            }
            CodegenError::ArchiveWriteError { .. } => {
                "The project archive could not be written.".to_string()
            }
            CodegenError::InvalidSchema { message } => format!("The schema is invalid: {}", message),
            CodegenError::ApiError(_) => "Could not reach the text generation service.".to_string(),
            CodegenError::IoError(e) => format!("A file system operation failed: {}", e),
            CodegenError::SerializationError(e) => format!("Could not serialize data: {}", e),
            CodegenError::ConfigError { message } => format!("Configuration problem: {}", message),
            CodegenError::ConfigValidationError { field, message } => {
                format!("Configuration field '{}' is invalid: {}", field, message)
            }
            CodegenError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration field '{}' is invalid: {}", field, reason)
            }
            CodegenError::MissingConfigError { field } => {
                format!("Configuration field '{}' is required.", field)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Generation => {
                "Retry the request; the model likely truncated or mis-formatted its output"
            }
            ErrorCategory::Artifact => {
                "Retry the request or adjust the schema so each generated type declares a package"
            }
            ErrorCategory::Archive => "Check available disk space and temp directory permissions",
            ErrorCategory::Input => "Provide a JSON object with a non-empty 'rootPackage' field",
            ErrorCategory::Configuration => "Review the configuration file and environment variables",
            ErrorCategory::Network => {
                "Check the generation endpoint, API key and network connectivity"
            }
            ErrorCategory::System => "Check file system permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, CodegenError>;
