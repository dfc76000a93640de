use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Embed(embedfs::Error),
    Io(std::io::Error),
    CliInput(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Embed(err) => write!(f, "embedfs error: {}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::CliInput(msg) => write!(f, "CLI input error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Embed(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::CliInput(_) => None,
        }
    }
}

impl std::convert::From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Error {
        Error::Io(error)
    }
}

impl std::convert::From<embedfs::Error> for Error {
    fn from(error: embedfs::Error) -> Error {
        Error::Embed(error)
    }
}
