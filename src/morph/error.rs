//! Morph error types.

use thiserror::Error;

/// Errors raised inside the morph stage.
///
/// None of these reach callers of [`Morpher::transform`](super::Morpher::transform),
/// which always hands back a template.
#[derive(Debug, Error)]
pub enum MorphError {
    #[error("HTML parser `{parser}` is unavailable: {reason}")]
    ParserUnavailable {
        parser: &'static str,
        reason: String,
    },

    #[error("failed to parse template with `{parser}`: {reason}")]
    Parse {
        parser: &'static str,
        reason: String,
    },
}
