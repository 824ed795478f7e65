// Error types

use std::fmt;

#[derive(Debug)]
pub enum Error {
    BackendEnvNotFound(String),
    MissingSecretId,
    Prompt(String),
    RemoteFetch(String),
    RemoteUpdate(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendEnvNotFound(path) => {
                write!(f, "Backend environment file '{}' not found", path)
            }
            Error::MissingSecretId => write!(f, "No secret name or ARN provided"),
            Error::Prompt(msg) => write!(f, "Prompt failed: {}", msg),
            Error::RemoteFetch(msg) => write!(f, "Failed to fetch remote secret: {}", msg),
            Error::RemoteUpdate(msg) => write!(f, "Failed to update remote secret: {}", msg),
            Error::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
