//! Coefficient entropy coding error types.
//!
//! Errors are almost entirely malformed-input errors raised on the decode
//! path. Caller bugs (invalid scan combinations, coding the end-of-superblock
//! sentinel) are asserted instead.

use thiserror::Error;

/// Coefficient entropy coding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoefError {
    /// Tree traversal reached a node outside the coefficient tree.
    #[error("Invalid coefficient tree node: {0}")]
    InvalidTreeNode(usize),

    /// A derived context index fell outside its valid range.
    #[error("Coefficient context {context} out of range (max {max})")]
    ContextOutOfRange {
        /// Computed context.
        context: usize,
        /// Largest valid context.
        max: usize,
    },

    /// A band index fell outside its valid range.
    #[error("Coefficient band {0} out of range")]
    BandOutOfRange(usize),

    /// A probability table index was outside the table dimensions.
    #[error("Probability table index out of range: {what} = {value}")]
    IndexOutOfRange {
        /// Name of the offending dimension.
        what: &'static str,
        /// Offending value.
        value: usize,
    },

    /// The bool decoder consumed bits past the end of its buffer.
    #[error("Unexpected end of coefficient stream")]
    UnexpectedEndOfStream,

    /// Bool decoder input is empty or its marker bit is set.
    #[error("Bool decoder error: {0}")]
    BoolDecoderError(String),

    /// A decoded coefficient does not fit the coefficient range.
    #[error("Coefficient magnitude {0} exceeds maximum")]
    MagnitudeOverflow(u32),

    /// Encoder and decoder disagree on out-of-band configuration.
    #[error("Configuration mismatch: {0}")]
    ConfigMismatch(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coefficient entropy coding result type.
pub type Result<T> = std::result::Result<T, CoefError>;

impl CoefError {
    /// Create an out-of-range index error.
    pub fn index_out_of_range(what: &'static str, value: usize) -> Self {
        Self::IndexOutOfRange { what, value }
    }

    /// Whether this error indicates a corrupt coefficient stream.
    ///
    /// Corruption aborts decoding of the current frame; the enclosing decoder
    /// owns any concealment policy.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::InvalidTreeNode(_)
                | Self::ContextOutOfRange { .. }
                | Self::BandOutOfRange(_)
                | Self::IndexOutOfRange { .. }
                | Self::UnexpectedEndOfStream
                | Self::BoolDecoderError(_)
                | Self::MagnitudeOverflow(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoefError::InvalidTreeNode(23);
        assert_eq!(err.to_string(), "Invalid coefficient tree node: 23");
    }

    #[test]
    fn test_context_out_of_range() {
        let err = CoefError::ContextOutOfRange { context: 7, max: 5 };
        assert!(err.to_string().contains("7"));
        assert!(err.to_string().contains("max 5"));
    }

    #[test]
    fn test_index_out_of_range() {
        let err = CoefError::index_out_of_range("band", 6);
        assert_eq!(err.to_string(), "Probability table index out of range: band = 6");
    }

    #[test]
    fn test_is_corruption() {
        assert!(CoefError::UnexpectedEndOfStream.is_corruption());
        assert!(CoefError::BandOutOfRange(9).is_corruption());
        assert!(!CoefError::ConfigMismatch("compact model".into()).is_corruption());
        assert!(!CoefError::InvalidConfig("nodes".into()).is_corruption());
    }
}
