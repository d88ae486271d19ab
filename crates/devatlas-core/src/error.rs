use std::fmt;
use std::path::PathBuf;

/// Machine-readable error codes for scripting against `atlas` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    CatalogParseError,
    CatalogDuplicateId,
    TrackNotFound,
    LessonNotFound,
    InvalidDate,
    StateReadFailed,
    StateWriteFailed,
    LockContention,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::CatalogParseError => "E1002",
            Self::CatalogDuplicateId => "E1003",
            Self::TrackNotFound => "E2001",
            Self::LessonNotFound => "E2002",
            Self::InvalidDate => "E2003",
            Self::StateReadFailed => "E5001",
            Self::StateWriteFailed => "E5002",
            Self::LockContention => "E5003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::CatalogParseError => "Catalog file parse error",
            Self::CatalogDuplicateId => "Duplicate id in catalog",
            Self::TrackNotFound => "Track not found",
            Self::LessonNotFound => "Lesson not found",
            Self::InvalidDate => "Invalid calendar date",
            Self::StateReadFailed => "Progress state read failed",
            Self::StateWriteFailed => "Progress state write failed",
            Self::LockContention => "Lock contention",
        }
    }

    /// Optional remediation hint that can be surfaced to the user.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in ~/.config/devatlas/config.toml and retry."),
            Self::CatalogParseError => {
                Some("Check the catalog file; supported formats are .toml, .json, .yaml.")
            }
            Self::CatalogDuplicateId => {
                Some("Lesson ids must be unique across the whole catalog.")
            }
            Self::TrackNotFound => Some("Run `atlas tracks` to list track ids."),
            Self::LessonNotFound => Some("Run `atlas show <track>` to list lesson ids."),
            Self::InvalidDate => Some("Dates use the YYYY-MM-DD format."),
            Self::StateReadFailed | Self::StateWriteFailed => {
                Some("Check permissions on the state directory.")
            }
            Self::LockContention => Some("Retry after the other `atlas` process finishes."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors surfaced by the core library.
///
/// Malformed persisted progress is never an error: it is recovered as empty
/// state by [`crate::store::load_state`].
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("failed to parse config {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("failed to parse catalog {}: {message}", .path.display())]
    CatalogParse { path: PathBuf, message: String },

    #[error("duplicate {kind} id '{id}' in catalog")]
    DuplicateId { kind: &'static str, id: String },

    #[error("track not found: '{0}'")]
    UnknownTrack(String),

    #[error("lesson not found: '{0}'")]
    UnknownLesson(String),

    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("failed to read progress state: {0}")]
    StateRead(#[source] std::io::Error),

    #[error("failed to write progress state: {0}")]
    StateWrite(#[source] std::io::Error),

    #[error("state lock timed out after {waited:?} at {}", .path.display())]
    LockTimeout {
        path: PathBuf,
        waited: std::time::Duration,
    },
}

impl AtlasError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Config { .. } => ErrorCode::ConfigParseError,
            Self::CatalogParse { .. } => ErrorCode::CatalogParseError,
            Self::DuplicateId { .. } => ErrorCode::CatalogDuplicateId,
            Self::UnknownTrack(_) => ErrorCode::TrackNotFound,
            Self::UnknownLesson(_) => ErrorCode::LessonNotFound,
            Self::InvalidDate(_) => ErrorCode::InvalidDate,
            Self::StateRead(_) => ErrorCode::StateReadFailed,
            Self::StateWrite(_) => ErrorCode::StateWriteFailed,
            Self::LockTimeout { .. } => ErrorCode::LockContention,
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}
