use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or unknown filter input: bad field names, bad enum values,
    /// non-integer pagination, unknown time units. Maps to a 4xx response.
    #[error("Invalid usage: {0}")]
    InvalidUsage(String),

    /// A filter value of the wrong type, e.g. a non-boolean rollback value.
    /// Distinct from `InvalidUsage`: this signals a contract error in the
    /// caller rather than a merely invalid domain value.
    #[error("Bad parameter: {0}")]
    BadParameter(String),

    /// Lifecycle precondition violation, e.g. stopping a package that was
    /// never started.
    #[error("Workflow error: {0}")]
    Workflow(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}

impl Error {
    /// HTTP-equivalent status for callers that surface errors over the wire.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidUsage(_) | Self::BadParameter(_) | Self::Workflow(_) => 400,
            Self::NotFound(_) => 404,
            Self::Lock(_) | Self::Io(_) | Self::Serialization(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_per_error_class() {
        assert_eq!(Error::InvalidUsage("bad field".to_string()).status_code(), 400);
        assert_eq!(Error::BadParameter("bad boolean".to_string()).status_code(), 400);
        assert_eq!(Error::Workflow("not started".to_string()).status_code(), 400);
        assert_eq!(Error::NotFound("Release".to_string()).status_code(), 404);
        assert_eq!(Error::Lock("poisoned".to_string()).status_code(), 500);
    }
}
