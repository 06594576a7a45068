//! Error types for song validation and processing.

use thiserror::Error;

/// Error codes reported by song validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Shape errors (E001-E004)
    /// E001: Required field is absent
    MissingField,
    /// E002: Field has the wrong JSON type
    WrongType,
    /// E003: Numeric value outside its documented bound
    OutOfRange,
    /// E004: String value is not one of the allowed variants
    InvalidEnum,

    // Semantic errors (E010-E014)
    /// E010: Two tracks share an id
    DuplicateTrackId,
    /// E011: Measure index does not match its position
    MeasureIndexMismatch,
    /// E012: Note string number exceeds the track's string count
    StringBeyondInstrument,
    /// E013: Pitched note has neither string/fret nor midi pitch
    MissingPosition,
    /// E014: Document could not be decoded after the shape pass
    InvalidDocument,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::MissingField => "E001",
            ErrorCode::WrongType => "E002",
            ErrorCode::OutOfRange => "E003",
            ErrorCode::InvalidEnum => "E004",
            ErrorCode::DuplicateTrackId => "E010",
            ErrorCode::MeasureIndexMismatch => "E011",
            ErrorCode::StringBeyondInstrument => "E012",
            ErrorCode::MissingPosition => "E013",
            ErrorCode::InvalidDocument => "E014",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Warning codes reported by song validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// W001: Unknown field, dropped on decode
    UnknownField,
    /// W002: Song has no tracks
    NoTracks,
    /// W003: Tracks have different measure counts
    UnequalMeasureCounts,
    /// W004: Tuning length differs from stringCount
    TuningLengthMismatch,
    /// W005: Key signature not recognized
    UnrecognizedKey,
}

impl WarningCode {
    /// Returns the warning code string (e.g., "W001").
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::UnknownField => "W001",
            WarningCode::NoTracks => "W002",
            WarningCode::UnequalMeasureCounts => "W003",
            WarningCode::TuningLengthMismatch => "W004",
            WarningCode::UnrecognizedKey => "W005",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation error with code, message, and optional JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Path to the offending field (e.g., "tracks\[0\].measures\[2\].index").
    pub path: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation error with a JSON path.
    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validation warning with code, message, and optional JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub code: WarningCode,
    pub message: String,
    pub path: Option<String>,
}

impl ValidationWarning {
    /// Creates a new validation warning.
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation warning with a JSON path.
    pub fn with_path(
        code: WarningCode,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Result of song validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether validation passed (no errors).
    pub ok: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Creates a successful validation result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Creates a failed validation result.
    pub fn failure(errors: Vec<ValidationError>) -> Self {
        Self {
            ok: errors.is_empty(),
            errors,
            warnings: Vec::new(),
        }
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
        self.ok = false;
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Moves all findings of `other` into this result.
    pub fn merge(&mut self, other: ValidationResult) {
        for error in other.errors {
            self.add_error(error);
        }
        self.warnings.extend(other.warnings);
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Returns true if an error was reported at exactly `path`.
    pub fn has_error_at(&self, path: &str) -> bool {
        self.errors.iter().any(|e| e.path.as_deref() == Some(path))
    }

    /// Converts to a Result, returning Err if there are errors.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, SchemaViolation> {
        if self.ok {
            Ok(self.warnings)
        } else {
            Err(SchemaViolation {
                errors: self.errors,
                warnings: self.warnings,
            })
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::success()
    }
}

/// A document failed validation.
///
/// Carries every finding so callers can report all offending paths at once
/// and feed them back to whoever produced the document.
#[derive(Debug, Clone)]
pub struct SchemaViolation {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "song failed validation with {} error(s)", self.errors.len())?;
        if let Some(first) = self.errors.first() {
            write!(f, ": {}", first)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaViolation {}

impl SchemaViolation {
    /// Creates a violation from a single error.
    pub fn single(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
            warnings: Vec::new(),
        }
    }

    /// Paths of all offending fields, in report order.
    pub fn paths(&self) -> Vec<&str> {
        self.errors
            .iter()
            .filter_map(|e| e.path.as_deref())
            .collect()
    }
}

/// Top-level error type for song operations.
#[derive(Debug, Error)]
pub enum SongError {
    /// Song validation failed.
    #[error(transparent)]
    Validation(#[from] SchemaViolation),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Canonicalization error.
    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Common trait for backend errors.
///
/// Each backend error type implements this trait so the CLI can report
/// failures uniformly.
///
/// # Example
///
/// ```ignore
/// use tabforge_spec::error::BackendError;
///
/// fn report<E: BackendError>(err: E) {
///     eprintln!("[{}] {}", err.code(), err.message());
/// }
/// ```
pub trait BackendError: std::error::Error {
    /// Stable error code such as "MIDI_001" or "AGENT_002".
    fn code(&self) -> &'static str;

    /// Human-readable message; defaults to `Display`.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Error category such as "midi" or "agent".
    fn category(&self) -> &'static str;
}
