use thiserror::Error;

/// Failures inside the markup engine. None of them escape [`crate::Converter`];
/// they are rendered as diagnostic fragments in place of the offending markup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("template nesting exceeds {limit} levels")]
    DepthExceeded { limit: usize },
}

pub type Result<T> = std::result::Result<T, MarkupError>;
