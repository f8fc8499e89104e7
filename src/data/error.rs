use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can abort a load. A failed load never touches the bank that
/// was loaded before it.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The caller handed over a path that is null or not valid UTF-8.
    #[error("invalid path argument")]
    InvalidPath,

    #[error("question file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document parsed but its top level is not a list of questions.
    #[error("{}: {message}", path.display())]
    Structure { path: PathBuf, message: String },

    /// Raised only under [`UnknownRecordPolicy::Reject`](super::UnknownRecordPolicy::Reject).
    #[error("{}: question {index} is not a supported record: {reason}", path.display())]
    UnsupportedRecord {
        path: PathBuf,
        index: usize,
        reason: String,
    },
}

impl LoadError {
    /// Status code reported across the C boundary. `0` is reserved for
    /// success.
    pub fn status_code(&self) -> i32 {
        match self {
            LoadError::InvalidPath => 1,
            LoadError::NotFound { .. } => 2,
            LoadError::Read { .. } => 3,
            LoadError::Parse { .. } => 4,
            LoadError::Structure { .. } => 5,
            LoadError::UnsupportedRecord { .. } => 6,
        }
    }

    pub(crate) fn from_io(path: PathBuf, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            LoadError::NotFound { path }
        } else {
            LoadError::Read { path, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_distinct_and_nonzero() {
        let path = PathBuf::from("q.yaml");
        let errors = [
            LoadError::InvalidPath,
            LoadError::NotFound { path: path.clone() },
            LoadError::from_io(path.clone(), io::Error::other("boom")),
            LoadError::Structure {
                path: path.clone(),
                message: "x".into(),
            },
            LoadError::UnsupportedRecord {
                path,
                index: 0,
                reason: "y".into(),
            },
        ];

        let mut codes: Vec<i32> = errors.iter().map(LoadError::status_code).collect();
        assert!(codes.iter().all(|c| *c != 0));
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_not_found_is_classified() {
        let err = LoadError::from_io(
            PathBuf::from("/nonexistent/path.yaml"),
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert!(err.to_string().contains("/nonexistent/path.yaml"));
    }
}
