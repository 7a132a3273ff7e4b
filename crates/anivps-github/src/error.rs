//! Error type for provider calls.
//!
//! Every failure is folded into [`AppError`] at the crate boundary:
//! transport timeouts become `Timeout`, everything else `Provider`.

use anivps_core::error::AppError;
use thiserror::Error;

/// Failure talking to the GitHub REST API.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The provider answered with a non-2xx status.
    #[error("{operation} failed with HTTP {status}: {message}")]
    Api {
        /// What was being attempted.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// The provider's `message`, or the raw body.
        message: String,
    },

    /// Transport failure (DNS, TLS, connection reset, timeout).
    #[error("{operation} request failed: {source}")]
    Http {
        /// What was being attempted.
        operation: &'static str,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The log bundle exceeded the configured size limit.
    #[error("Log bundle of {size} bytes exceeds the {limit} byte limit")]
    BundleTooLarge {
        /// Actual size.
        size: u64,
        /// Configured limit.
        limit: u64,
    },

    /// The log bundle looked like a zip archive but could not be read.
    #[error("Log bundle is not a readable zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Reading an archive entry failed.
    #[error("Failed to read log bundle entry: {0}")]
    Io(#[from] std::io::Error),
}

impl GitHubError {
    /// Wrap a reqwest error with the operation that produced it.
    pub fn http(operation: &'static str, source: reqwest::Error) -> Self {
        Self::Http { operation, source }
    }

    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<GitHubError> for AppError {
    fn from(err: GitHubError) -> Self {
        match &err {
            GitHubError::Http { source, .. } if source.is_timeout() => {
                AppError::timeout(err.to_string())
            }
            _ => AppError::provider(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anivps_core::error::ErrorKind;

    #[test]
    fn test_api_error_carries_status_and_message() {
        let err = GitHubError::Api {
            operation: "Repository creation",
            status: 422,
            message: "name already exists on this account".to_string(),
        };
        assert_eq!(err.status(), Some(422));

        let app: AppError = err.into();
        assert_eq!(app.kind, ErrorKind::Provider);
        assert!(app.message.contains("HTTP 422"));
        assert!(app.message.contains("name already exists"));
    }
}
