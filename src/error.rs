//! Error types shared across the viewer.

use thiserror::Error;

/// Errors raised by data loading, configuration and GPU setup.
///
/// Picking misses and empty datasets are not errors; they degrade to
/// "nothing hovered" and an empty scene respectively.
#[derive(Debug, Error)]
pub enum VizError {
    #[error("http request failed: {0}")]
    Http(String),

    #[error("http status {code}: {message}")]
    HttpStatus { code: u16, message: String },

    #[error("decode response failed: {0}")]
    Decode(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("surface setup failed: {0}")]
    Surface(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VizError>;

impl From<reqwest::Error> for VizError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            VizError::Decode(err.to_string())
        } else {
            VizError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_carry_server_message() {
        let err = VizError::HttpStatus {
            code: 404,
            message: "One or both users not found.".to_string(),
        };
        assert_eq!(err.to_string(), "http status 404: One or both users not found.");
    }
}
