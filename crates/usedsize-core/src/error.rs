//! # Error Types
//!
//! General error handling for size resolution.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use thiserror::Error;

use crate::types::Address;

/// Main error type for size queries
///
/// Every failure surfaces unchanged at the command that started the query.
/// Nothing is retried: a read that failed against a halted process will fail
/// again.
///
/// ## Error Categories
///
/// 1. **Resolution errors**: UnresolvedSymbol, InvalidExpression
/// 2. **Traversal errors**: CorruptStructure
/// 3. **Backend errors**: MemoryRead, Unsupported, Dwarf
/// 4. **I/O errors**: Io (log files, `/proc` access)
///
/// An unknown type is not an error: it is sized by its static byte size.
#[derive(Error, Debug)]
pub enum SizeError
{
    /// A symbol, type, member or template argument could not be resolved
    ///
    /// This happens when:
    /// - The object name is not a global known to the debug information
    /// - A record recipe names a type the image does not define
    /// - A container type lacks the control-block member we look for
    #[error("Unresolved symbol: {0}")]
    UnresolvedSymbol(String),

    /// A container's in-memory links violate the shape's invariants
    ///
    /// Raised instead of looping forever or returning a wrong number, e.g. when
    /// a list walk never returns to its sentinel, a tree walk meets a null link
    /// or the traversal limit is exceeded.
    #[error("Corrupt {container}: {reason}")]
    CorruptStructure
    {
        /// Object expression of the container being traversed
        container: String,
        /// What was inconsistent
        reason: String,
    },

    /// The object expression could not be parsed or evaluated
    #[error("Invalid expression '{expression}' at {position}: {reason}")]
    InvalidExpression
    {
        /// The expression text as given
        expression: String,
        /// Byte position of the failure
        position: usize,
        /// Description of the failure
        reason: String,
    },

    /// Reading the inspected address space failed
    #[error("Failed to read {length} bytes at {address}: {details}")]
    MemoryRead
    {
        /// Start of the failed read
        address: Address,
        /// Number of bytes requested
        length: usize,
        /// Backend-specific details
        details: String,
    },

    /// The backend does not support the requested operation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Debug information could not be parsed
    #[error("DWARF error while {context}: {details}")]
    Dwarf
    {
        /// What we were doing when parsing failed
        context: String,
        /// Error reported by gimli/object
        details: String,
    },

    /// I/O error (log files, `/proc` files, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SizeError
{
    /// Build a `CorruptStructure` error for the given container expression.
    pub fn corrupt(container: impl Into<String>, reason: impl Into<String>) -> Self
    {
        SizeError::CorruptStructure {
            container: container.into(),
            reason: reason.into(),
        }
    }

    /// Build an `InvalidExpression` error.
    pub fn invalid_expression(expression: impl Into<String>, position: usize, reason: impl Into<String>) -> Self
    {
        SizeError::InvalidExpression {
            expression: expression.into(),
            position,
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for `Result<T, SizeError>`
///
/// ```rust
/// use usedsize_core::error::SizeResult;
/// fn foo() -> SizeResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type SizeResult<T> = std::result::Result<T, SizeError>;
