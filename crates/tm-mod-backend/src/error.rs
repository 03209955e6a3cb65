/// Failure to get a usable reply from the backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// DNS, connection, timeout, or reading the body failed
    #[error("Network error: {0}")]
    Network(String),
    /// Non-success HTTP status without a readable JSON body
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// Body was not the JSON we expected
    #[error("Parse error: {0}")]
    Parse(String),
    /// The HTTP client could not be built
    #[error("Client error: {0}")]
    Client(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        BackendError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_network() {
        let e = BackendError::Network("connection refused".into());
        assert_eq!(e.to_string(), "Network error: connection refused");
    }

    #[test]
    fn display_status() {
        let e = BackendError::Status { status: 502, body: "bad gateway".into() };
        assert_eq!(e.to_string(), "HTTP 502: bad gateway");
    }

    #[test]
    fn display_parse() {
        let e = BackendError::Parse("expected value".into());
        assert_eq!(e.to_string(), "Parse error: expected value");
    }
}
