//! Error taxonomy shared by the backend client, the normalizer, and the
//! Markdown converter.
//!
//! Every failure a tool call can surface is one of these variants. The REST
//! layer downcasts to this type to pick a status code; the MCP bridge returns
//! the `Display` text as error content.

/// Errors raised while resolving, normalizing, or converting content.
#[derive(Debug)]
pub enum SourceError {
    /// The caller broke the argument contract (e.g. neither `id` nor `href`).
    InvalidArgument(String),
    /// A required key was absent (or wrongly typed) in a backend record.
    MissingField(String),
    /// The page's extension cannot be rendered as Markdown.
    UnsupportedFormat(String),
    /// The backend answered, but the requested object does not exist.
    NotFound(String),
    /// The backend could not be reached at the transport level.
    BackendUnavailable(String),
    /// The backend answered with a non-success status or a malformed payload.
    BackendError(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::InvalidArgument(msg) => write!(f, "{}", msg),
            SourceError::MissingField(key) => {
                write!(f, "record is missing required field '{}'", key)
            }
            SourceError::UnsupportedFormat(extension) => {
                write!(
                    f,
                    "cannot convert page to Markdown: unsupported extension {}",
                    extension
                )
            }
            SourceError::NotFound(what) => write!(f, "{} not found", what),
            SourceError::BackendUnavailable(detail) => {
                write!(f, "backend unreachable: {}", detail)
            }
            SourceError::BackendError(detail) => {
                write!(f, "backend request failed: {}", detail)
            }
        }
    }
}

impl std::error::Error for SourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_names_the_key() {
        let err = SourceError::MissingField("href".to_string());
        assert!(err.to_string().contains("'href'"));
    }

    #[test]
    fn test_unsupported_format_names_the_extension() {
        let err = SourceError::UnsupportedFormat(".pdf".to_string());
        let msg = err.to_string();
        assert!(msg.contains(".pdf"));
        assert!(msg.contains("Markdown"));
    }

    #[test]
    fn test_invalid_argument_passes_message_through() {
        let err = SourceError::InvalidArgument("either 'id' or 'href' must be provided".to_string());
        assert_eq!(err.to_string(), "either 'id' or 'href' must be provided");
    }

    #[test]
    fn test_variants_are_matchable() {
        let err = SourceError::NotFound("object 306".to_string());
        assert!(matches!(err, SourceError::NotFound(_)));
    }
}
