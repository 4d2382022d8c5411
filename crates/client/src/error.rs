use manuscript_core::services::ServiceError;

/// Errors from the service HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("service error ({status}): {body}")]
    Api { status: u16, body: String },
}

impl From<ClientError> for ServiceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Request(e) if e.is_timeout() => ServiceError::Timeout,
            ClientError::Request(e) if e.is_decode() => ServiceError::Decode(e.to_string()),
            ClientError::Request(e) => ServiceError::Transport(e.to_string()),
            ClientError::Api { status, body } => ServiceError::Status { status, body },
        }
    }
}
