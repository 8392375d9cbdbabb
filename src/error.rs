//! Error types for mdxql.
//!
//! Construction errors surface while a statement is being compiled, response
//! errors surface while a decoded cellset is materialized. Transport errors are
//! opaque and passed through unchanged.

use thiserror::Error;

/// mdxql error type
#[derive(Error, Debug)]
pub enum MdxError {
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Invalid attribute {0}")]
    InvalidAttribute(String),

    #[error("Invalid measure {0}")]
    InvalidMeasure(String),

    #[error("Invalid filter {0}")]
    InvalidFilter(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid {operation}: at least one {operand} must be specified")]
    EmptyOperands {
        operation: &'static str,
        operand: &'static str,
    },

    #[error("Axis not supported: {0}")]
    UnsupportedAxis(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for mdxql operations
pub type MdxResult<T> = Result<T, MdxError>;

impl MdxError {
    pub(crate) fn empty(operation: &'static str, operand: &'static str) -> Self {
        MdxError::EmptyOperands { operation, operand }
    }

    /// Construction errors are raised before anything is sent to a server.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            MdxError::InvalidExpression(_)
                | MdxError::InvalidAttribute(_)
                | MdxError::InvalidMeasure(_)
                | MdxError::InvalidFilter(_)
                | MdxError::InvalidQuery(_)
                | MdxError::EmptyOperands { .. }
                | MdxError::UnsupportedAxis(_)
        )
    }
}

impl serde::Serialize for MdxError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
