#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Got an invalid parameter value in a function
    InvalidParameter(String),
    /// A matrix or vector assigned to a model does not have the expected
    /// shape
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    /// The force field returned inconsistent data
    ForceField(String),
    /// Error while serializing/deserializing data
    Json(serde_json::Error),
    /// Error used for failed internal consistency check, i.e. bugs in
    /// springnet.
    Internal(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameter(e) => write!(f, "invalid parameter: {}", e),
            Error::ShapeMismatch { expected, got } => write!(
                f, "shape mismatch: expected shape {:?}, got {:?}", expected, got
            ),
            Error::ForceField(e) => write!(f, "force field error: {}", e),
            Error::Json(e) => write!(f, "json error: {}", e),
            Error::Internal(e) => {
                write!(f, "internal springnet error")?;
                if e.contains("assertion failed") {
                    write!(f, " (this is likely a bug, please report it)")?;
                }
                write!(f, ": {}", e)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidParameter(_) |
            Error::ShapeMismatch { .. } |
            Error::ForceField(_) |
            Error::Internal(_) => None,
            Error::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Json(error)
    }
}

impl From<ndarray::ShapeError> for Error {
    fn from(error: ndarray::ShapeError) -> Error {
        Error::Internal(format!("invalid array shape: {}", error))
    }
}
