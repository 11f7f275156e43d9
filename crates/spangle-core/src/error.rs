//! Pipeline error types

use thiserror::Error;

/// Errors raised while converting author text into a render tree
///
/// The pipeline catches these at the orchestration point and degrades to a
/// raw-text render; callers never see a blocked message.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Markup nesting went past the converter's recursion limit
    #[error("markup nesting exceeds depth limit ({0})")]
    DepthExceeded(usize),

    /// Input contains an unbroken run longer than the pipeline accepts
    #[error("input contains an unbroken word longer than {0} chars")]
    OversizedWord(usize),
}

/// Result type for conversion operations
pub type RenderResult<T> = Result<T, RenderError>;
