use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

const DEFAULT_RETRY_SECONDS: u64 = 60;

static RETRY_DELAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"retry_delay\s*\{\s*seconds\s*:\s*(\d+)\s*\}").expect("valid retry delay regex")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelFailure {
    #[error("API key is invalid or expired")]
    InvalidCredential,
    #[error("API quota exceeded; retry after {retry_seconds} seconds")]
    QuotaExceeded { retry_seconds: u64 },
    #[error("{0}")]
    Other(String),
}

pub fn classify_model_failure(message: &str) -> ModelFailure {
    if message.contains("API key expired") || message.contains("API_KEY_INVALID") {
        return ModelFailure::InvalidCredential;
    }

    if message.contains("429") && message.to_lowercase().contains("quota") {
        let retry_seconds = RETRY_DELAY_RE
            .captures(message)
            .and_then(|caps| caps.get(1))
            .and_then(|value| value.as_str().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_SECONDS);
        return ModelFailure::QuotaExceeded { retry_seconds };
    }

    ModelFailure::Other(message.to_string())
}

pub fn user_facing_model_error(err: &anyhow::Error) -> String {
    match classify_model_failure(&format!("{err:#}")) {
        ModelFailure::InvalidCredential => "Your Gemini API key has expired or is invalid. Please renew your API key.\n\n\
             To fix this issue:\n\
             1. Go to the Google AI Studio (https://ai.google.dev/)\n\
             2. Navigate to your API keys section\n\
             3. Create a new API key or renew your existing one\n\
             4. Update your .env file with the new API key\n\n\
             After updating your API key, restart the application."
            .to_string(),
        ModelFailure::QuotaExceeded { retry_seconds } => format!(
            "You've reached your current quota limit for the Gemini API. Please try again in {retry_seconds} seconds.\n\
             For more information, visit https://ai.google.dev/gemini-api/docs/rate-limits"
        ),
        ModelFailure::Other(message) => format!(
            "An error occurred with the Gemini API: {message}\n\
             Please try again later or contact support if the issue persists."
        ),
    }
}

// Terminal-ready message. main renders its error return with {:?}, so Debug
// writes the raw text instead of a quoted, escaped string.
pub struct UserFacingError(pub String);

impl fmt::Display for UserFacingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for UserFacingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for UserFacingError {}
