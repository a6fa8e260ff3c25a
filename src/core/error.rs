use thiserror::Error as ThisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown node kind, missing operand, or a nested result of the wrong shape
    MalformedQuery,
    /// The postings reference a document the document store does not hold
    InconsistentIndex,
    InvalidDocument,
    Io,
    Serialization,
    Corrupted,
    Internal,
}

#[derive(Debug, ThisError)]
#[error("{kind:?}: {context}")]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Error { kind, context: context.into() }
    }

    pub fn malformed(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::MalformedQuery, context)
    }

    pub fn inconsistent(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::InconsistentIndex, context)
    }

    pub fn is_malformed_query(&self) -> bool {
        self.kind == ErrorKind::MalformedQuery
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error {
            kind: ErrorKind::Serialization,
            context: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Serialization,
            context: format!("JSON error: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_context() {
        let err = Error::malformed("unknown operator FOO");
        assert_eq!(err.to_string(), "MalformedQuery: unknown operator FOO");
        assert!(err.is_malformed_query());
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert_eq!(err.kind, ErrorKind::Io);
    }
}
