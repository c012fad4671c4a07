use std::fmt;

#[derive(Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    Config(String),
    Connection(String),
    Api { status: u16, message: String },
    Serialization(String),
    DeadlineExceeded(String),
    Cancelled(String),
    Worker(String),
    Io(String),
    Duration(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl ::std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Config(ref err) => write!(f, "configuration error: {}", err),
            Error::Connection(ref err) => write!(f, "connection error: {}", err),
            Error::Api {
                status,
                ref message,
            } => write!(f, "provisioner responded {}: {}", status, message),
            Error::Serialization(ref err) => write!(f, "malformed payload: {}", err),
            Error::DeadlineExceeded(ref what) => write!(f, "deadline exceeded while {}", what),
            Error::Cancelled(ref what) => write!(f, "cancelled while {}", what),
            Error::Worker(ref err) => write!(f, "worker aborted: {}", err),
            Error::Io(ref err) => write!(f, "io error: {}", err),
            Error::Duration(ref err) => write!(f, "{}", err),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<hyper::Error> for Error {
    fn from(err: hyper::Error) -> Self {
        Error::Connection(err.to_string())
    }
}

impl From<hyper::http::Error> for Error {
    fn from(err: hyper::http::Error) -> Self {
        Error::Connection(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}
