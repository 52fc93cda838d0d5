use thiserror::Error;

/// Errors that can occur during recipe extraction operations
#[derive(Error, Debug)]
pub enum ExtractError {
    /// URL failed safety validation (unsafe scheme, blocked host or address)
    #[error("Unsafe URL blocked: {0}")]
    UnsafeUrl(String),

    /// HTTP request failed (timeout, connection error)
    #[error("Failed to fetch URL: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// External downloader tool is missing or unusable
    #[error("Downloader tool unavailable: {0}")]
    ToolUnavailable(String),

    /// The model response could not be parsed as a JSON recipe
    #[error("Model did not return valid JSON: {0}")]
    InvalidModelOutput(String),

    /// Candidate recipe is missing ingredients or instructions
    #[error("Not a recipe: {0}")]
    IncompleteRecipe(String),

    /// No usable source material remained after all fallback tiers
    #[error("No content available: {0}")]
    NoContent(String),

    /// Webpage text was too short to attempt extraction
    #[error("Insufficient content: {0} characters of usable text")]
    InsufficientContent(usize),

    /// Filesystem error while persisting artifacts
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ExtractError {
    /// Whether the orchestrator may advance to the next fallback tier.
    ///
    /// Unsafe input and validation rejections are terminal; network and
    /// tool failures only exhaust the current source.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            ExtractError::Network(_)
                | ExtractError::HttpStatus { .. }
                | ExtractError::ToolUnavailable(_)
                | ExtractError::NoContent(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_errors_advance_fallback() {
        assert!(ExtractError::ToolUnavailable("yt-dlp".into()).is_soft());
        assert!(ExtractError::NoContent("no metadata".into()).is_soft());
        assert!(ExtractError::HttpStatus {
            status: 503,
            url: "https://example.com".into()
        }
        .is_soft());
    }

    #[test]
    fn test_hard_errors_stop_the_request() {
        assert!(!ExtractError::UnsafeUrl("http://localhost".into()).is_soft());
        assert!(!ExtractError::IncompleteRecipe("missing ingredients".into()).is_soft());
        assert!(!ExtractError::InvalidModelOutput("trailing garbage".into()).is_soft());
        assert!(!ExtractError::InsufficientContent(42).is_soft());
    }
}
