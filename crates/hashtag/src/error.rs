use thiserror::Error;
use vision_llm::CompletionError;

pub type HashtagResult<T> = std::result::Result<T, HashtagError>;

/// Every variant displays as the message shown to the user.
#[derive(Error, Debug)]
pub enum HashtagError {
    #[error("Please select an image, artboard or frame first.")]
    NoSelection,

    #[error("Please select an image file, frame or artboard.")]
    InvalidSelectionType,

    #[error("Image must be smaller than {} (got {size} bytes).", megabytes(.limit))]
    SizeLimitExceeded { size: u64, limit: u64 },

    #[error("Please enter your OpenAI API key.")]
    MissingCredential,

    #[error("Invalid API key. Please check your OpenAI API key.")]
    AuthError,

    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimited,

    #[error("API request failed: {status} - {detail}")]
    ProviderError { status: u16, detail: String },

    #[error("Could not reach the AI service: {0}")]
    TransportError(String),

    #[error("No content received from the AI service.")]
    EmptyCompletion,

    #[error("No valid hashtags found to create.")]
    NoHashtagsFound,

    #[error("Could not load fonts. Please try again.")]
    FontUnavailable,

    #[error("Host operation failed: {0}")]
    Host(#[from] anyhow::Error),
}

const MIB: u64 = 1024 * 1024;

/// Whole megabytes print without a fraction, anything else with one digit.
fn megabytes(bytes: &u64) -> String {
    let bytes = *bytes;
    if bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{:.1}MB", bytes as f64 / MIB as f64)
    }
}

impl From<CompletionError> for HashtagError {
    fn from(e: CompletionError) -> Self {
        match e {
            CompletionError::Unauthorized | CompletionError::InvalidCredential => Self::AuthError,
            CompletionError::RateLimited => Self::RateLimited,
            CompletionError::Provider { status, detail } => Self::ProviderError { status, detail },
            CompletionError::Transport(e) => Self::TransportError(e.to_string()),
            CompletionError::InvalidEndpoint(e) => Self::TransportError(e),
            CompletionError::EmptyCompletion => Self::EmptyCompletion,
            CompletionError::Decode(e) => Self::ProviderError {
                status: 200,
                detail: e.to_string(),
            },
        }
    }
}
