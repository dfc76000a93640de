pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Path absent from the store (or from the host, in debug mode and for include paths).
    NotFound(String),
    InvalidInput(String),
    /// Operation attempted on a handle after `close`.
    Closed(String),
    Hex(hex::FromHexError),
    Gzip(std::io::Error),
    Io(std::io::Error),
    Walk(walkdir::Error),
    Json(serde_json::Error),
}

impl Error {
    /// True for corrupt stored content: bad hex or a broken gzip stream.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Error::Hex(_) | Error::Gzip(_))
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::NotFound(ref path) => write!(f, "NotFound: {path}"),
            Error::InvalidInput(ref msg) => write!(f, "InvalidInput: {msg}"),
            Error::Closed(ref path) => write!(f, "Closed: {path}"),
            Error::Hex(ref err) => write!(f, "DecodeFailure (hex): {err}"),
            Error::Gzip(ref err) => write!(f, "DecodeFailure (gzip): {err}"),
            Error::Io(ref err) => write!(f, "IoError: {err}"),
            Error::Walk(ref err) => write!(f, "WalkError: {err}"),
            Error::Json(ref err) => write!(f, "JsonError: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Hex(ref err) => Some(err),
            Error::Gzip(ref err) => Some(err),
            Error::Io(ref err) => Some(err),
            Error::Walk(ref err) => Some(err),
            Error::Json(ref err) => Some(err),
            _ => None,
        }
    }
}

impl std::convert::From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Error {
        Error::Io(error)
    }
}

impl std::convert::From<hex::FromHexError> for Error {
    fn from(error: hex::FromHexError) -> Error {
        Error::Hex(error)
    }
}

impl std::convert::From<walkdir::Error> for Error {
    fn from(error: walkdir::Error) -> Error {
        Error::Walk(error)
    }
}

impl std::convert::From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Json(error)
    }
}

/// `Read`/`Seek` can only surface `io::Error`; keep our error as the inner payload so callers
/// can still downcast it.
impl std::convert::From<Error> for std::io::Error {
    fn from(error: Error) -> std::io::Error {
        match error {
            Error::Io(err) => err,
            Error::NotFound(_) => std::io::Error::new(std::io::ErrorKind::NotFound, error),
            other => std::io::Error::new(std::io::ErrorKind::Other, other),
        }
    }
}
