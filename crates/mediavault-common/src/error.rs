//! Unified error type for mediavault.
//!
//! Every component funnels its failures into [`Error`]. Only the message and
//! the stable [`ErrorKind`] cross the HTTP boundary; [`Error::http_status`]
//! gives handlers the status code for each kind.

use std::fmt;
use std::sync::Arc;

/// Stable error classification exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Record, file or segment absent.
    NotFound,
    /// Malformed input, e.g. an unparseable YouTube URL.
    BadRequest,
    /// A path resolved outside its sandbox root.
    Forbidden,
    /// Extension or remote content type outside the allow-list.
    UnsupportedMediaType,
    /// Encoder failure, filesystem error or anything unexpected.
    ServerError,
}

impl ErrorKind {
    /// Snake-case code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::Forbidden => "forbidden",
            Self::UnsupportedMediaType => "unsupported_media_type",
            Self::ServerError => "server_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Unified error type covering every failure mode of the streaming engine.
///
/// The type is `Clone` so that a single in-flight build can report the same
/// outcome to every caller waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "video", "file", "segment").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The stored locator could not be interpreted.
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    /// The request itself is malformed (bad segment name, bad upload).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The path escapes its sandbox root.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The content type is not on the audio/video allow-list.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// An external encoder invocation failed.
    #[error("Transcode error [{tool}]: {message}")]
    Transcode {
        /// Name of the tool that failed.
        tool: String,
        /// Exit status and captured diagnostic output.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        source: Arc<std::io::Error>,
    },

    /// A catalog query failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            source: Arc::new(source),
        }
    }
}

impl Error {
    /// Classify this error into the stable taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::InvalidLocator(_) | Error::BadRequest(_) => ErrorKind::BadRequest,
            Error::Forbidden(_) => ErrorKind::Forbidden,
            Error::UnsupportedMediaType(_) => ErrorKind::UnsupportedMediaType,
            Error::Transcode { .. }
            | Error::Io { .. }
            | Error::Database(_)
            | Error::Internal(_) => ErrorKind::ServerError,
        }
    }

    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::BadRequest => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::UnsupportedMediaType => 415,
            ErrorKind::ServerError => 500,
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Transcode`].
    pub fn transcode(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transcode {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::BadRequest`].
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Error::BadRequest(msg.into())
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(msg: impl Into<String>) -> Self {
        Error::Database(msg.into())
    }

    /// Convenience constructor for [`Error::Internal`].
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
