use thiserror::Error;

/// Errors raised by tree navigation, editing and tracking.
///
/// All of these are precondition failures reported to the immediate caller. Broken tree invariants
/// (a producer handing in malformed value nodes) are not reported here; they trip debug assertions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    /// A child, token or trivia index was past the end of its sequence.
    #[error("index {index} is out of range for a sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// An argument did not satisfy the operation's preconditions.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The operation is not valid for the current state of its receiver.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
}

pub type Result<T, E = SyntaxError> = std::result::Result<T, E>;

impl SyntaxError {
    pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
        if index < len {
            Ok(())
        } else {
            Err(SyntaxError::IndexOutOfRange { index, len })
        }
    }
}
