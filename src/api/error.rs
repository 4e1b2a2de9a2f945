/// Errors returned by the track API client.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-success status code.
    #[error("server returned HTTP {status} for {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Request URL
        url: String,
    },

    /// Connection, timeout or response decoding failure.
    #[error("request to {url} failed: {source}")]
    Request {
        /// Request URL
        url: String,
        /// Underlying client error
        #[source]
        source: ureq::Error,
    },

    /// Writing a downloaded file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub(super) fn from_ureq(url: &str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(status) => Self::Status {
                status,
                url: url.to_string(),
            },
            other => Self::Request {
                url: url.to_string(),
                source: other,
            },
        }
    }

    /// HTTP status code, when the failure came from the server.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
