//! Error types for the protocol core

use thiserror::Error;

/// Protocol-level errors
///
/// `BufferOverflow` indicates protocol desync and is treated as fatal by
/// the link layer; the remaining variants leave the link usable for the
/// next request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Register access width other than 1, 2 or 4 bytes
    #[error("invalid register access width: {0} bytes")]
    InvalidWidth(u32),

    /// Response field that does not parse as hexadecimal
    #[error("malformed response field: {0:?}")]
    MalformedResponse(String),

    /// Response field count does not match the operation count
    #[error("response has {got} fields, expected {expected}")]
    FieldCountMismatch {
        /// Number of operations in the request
        expected: usize,
        /// Number of fields the device returned
        got: usize,
    },

    /// Batch serialized with no operations
    #[error("batch contains no operations")]
    EmptyBatch,

    /// Batch exceeds the device's onboard operation buffer
    #[error("batch is full ({0} operations)")]
    BatchFull(usize),

    /// Incoming frame exceeded the configured reassembly capacity
    #[error("frame exceeds buffer capacity of {0} bytes")]
    BufferOverflow(usize),
}

/// Result type alias using the core error type
pub type Result<T> = core::result::Result<T, CoreError>;
