use thiserror::Error;

pub type CompletionResult<T> = std::result::Result<T, CompletionError>;

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("invalid credential")]
    Unauthorized,

    #[error("rate limited by provider")]
    RateLimited,

    #[error("provider error {status}: {detail}")]
    Provider { status: u16, detail: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned no content")]
    EmptyCompletion,

    #[error("failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("credential can not be used as a header value")]
    InvalidCredential,
}

impl CompletionError {
    /// Map a non-2xx response onto the failure taxonomy.
    /// `body` is kept verbatim for anything that is not 401 or 429.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => Self::Unauthorized,
            429 => Self::RateLimited,
            _ => Self::Provider {
                status,
                detail: body,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CompletionError;

    #[test]
    fn test_from_status() {
        assert!(matches!(
            CompletionError::from_status(401, "nope".into()),
            CompletionError::Unauthorized
        ));
        assert!(matches!(
            CompletionError::from_status(429, "slow down".into()),
            CompletionError::RateLimited
        ));

        let body = r#"{"error":{"message":"model not found"}}"#.to_string();
        match CompletionError::from_status(404, body.clone()) {
            CompletionError::Provider { status, detail } => {
                assert_eq!(status, 404);
                assert_eq!(detail, body);
            }
            e => panic!("unexpected error: {:?}", e),
        }
    }
}
