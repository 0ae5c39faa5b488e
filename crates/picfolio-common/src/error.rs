//! Common error types used throughout picfolio.
//!
//! Every operation of the album and image managers fails with [`Error`]. The
//! variants keep the originating layer (database, filesystem, codec) for
//! logging, while [`Error::kind`] collapses them into the small set of kinds
//! a request handler has to distinguish.

/// Common error type for picfolio.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested record was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The uploaded bytes are not a supported or intact image.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A filesystem operation failed on a known path.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A write would break an album/image consistency rule.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Record absent.
    NotFound,
    /// Unsupported or corrupt image input.
    Decode,
    /// Database or filesystem failure.
    Storage,
    /// Rejected input.
    InvalidInput,
    /// Album/image consistency rule would be broken.
    InvariantViolation,
    /// Anything else.
    Internal,
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Decode error.
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new Storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new InvariantViolation error.
    pub fn invariant<S: Into<String>>(msg: S) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// The kind of failure, with database and filesystem errors folded into
    /// [`ErrorKind::Storage`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Database(_) | Self::Io(_) | Self::Storage(_) => ErrorKind::Storage,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::InvariantViolation(_) => ErrorKind::InvariantViolation,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether this is a [`ErrorKind::NotFound`] error.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
