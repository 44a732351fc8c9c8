use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("could not load image {path}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize meme metadata")]
    Serialization(#[from] serde_json::Error),

    #[error("malformed meme metadata in {path}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Failures after which the session cannot usefully go on. A failed
    /// write is not one of them: the user can fix the target and save again.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Serialization(_))
    }
}

/// Why a label typed for a fresh rectangle was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidLabel {
    #[error("label prompt was cancelled")]
    Cancelled,
    #[error("label is empty")]
    Empty,
    #[error("bad label identifier '{0}': labels may not contain whitespace")]
    ContainsWhitespace(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_serialization_failures_are_fatal() {
        let io = Error::Io {
            path: PathBuf::from("/nowhere/x.meme"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(!io.is_fatal());

        let ser = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(Error::Serialization(ser).is_fatal());
    }
}
