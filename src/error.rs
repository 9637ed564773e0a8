use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    ConditionsNotMet(String),
    #[error("{0}")]
    Internal(String),
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),
    #[error("encoding error: {0}")]
    Codec(#[from] bincode::Error),
}

/// Coarse classification used by callers to decide how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    ConditionsNotMet,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::ConditionsNotMet(_) => ErrorKind::ConditionsNotMet,
            Error::Internal(_) | Error::Storage(_) | Error::Codec(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn poisoned(what: &str) -> Self {
        Error::Internal(format!("lock on {} was poisoned", what))
    }
}
