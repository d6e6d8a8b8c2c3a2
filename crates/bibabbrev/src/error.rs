pub(crate) type DynError = Box<dyn std::error::Error + Send + Sync>;

/// The Errors that may occur when building the abbreviations database or rewriting a
/// bibliography.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    source: Option<DynError>,
}

/// Types of errors that make up an [`Error`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The abbreviations page could not be retrieved.
    Network,
    /// The fetched page has no preformatted block to read abbreviations from.
    MissingBlock,
    /// The preformatted block exists but a data node in it cannot be read as a record.
    MalformedBlock,
    /// A primary or supplementary database document cannot be parsed.
    DatabaseParse,
    /// The bibliography cannot be parsed as `BibTeX`.
    Bibliography,
    /// The error is associated with an underlying IO error.
    IO,
    /// The configuration cannot be resolved.
    Config,
}

impl Error {
    /// Creates a new [`Error`] based on the [`ErrorKind`] and message to describe the error.
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: Some(message.into()),
            source: None,
        }
    }

    /// Wraps an existing error as the source of [`Error`].
    pub fn wrap<E>(kind: ErrorKind, source: E) -> Self
    where
        E: Into<DynError>,
    {
        Self {
            kind,
            message: None,
            source: Some(source.into()),
        }
    }

    /// Wraps an existing error as the source of [`Error`] with a message describing what was
    /// being attempted.
    pub fn wrap_with<S, E>(kind: ErrorKind, message: S, source: E) -> Self
    where
        S: Into<String>,
        E: Into<DynError>,
    {
        Self {
            kind,
            message: Some(message.into()),
            source: Some(source.into()),
        }
    }

    /// Returns the kind of error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ErrorKind::Network => f.write_str("Network error")?,
            ErrorKind::MissingBlock => f.write_str("Parse error")?,
            ErrorKind::MalformedBlock => f.write_str("Malformed abbreviations block")?,
            ErrorKind::DatabaseParse => f.write_str("Database parse error")?,
            ErrorKind::Bibliography => f.write_str("Bibliography parse error")?,
            ErrorKind::IO => f.write_str("IO error")?,
            ErrorKind::Config => f.write_str("Configuration error")?,
        };

        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }

        if let Some(cause) = &self.source {
            write!(f, ": caused by {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| &**e as _)
    }
}
