//! repdef error types

use crate::common::{DefinitionLevel, RepetitionLevel};
use thiserror::Error;

/// Result type for [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error raised by a physical reader or writer implementation.
pub type PhysicalError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error Type
#[derive(Debug, Error)]
pub enum Error {
    /// The logical shape of a column (or of a value written to it) does not
    /// match the column's schema frames.
    #[error("unsupported shape for column '{column}': {message}")]
    UnsupportedShape { column: String, message: String },

    /// A null value was supplied where the schema frame is required.
    #[error("cannot write a null {what} value for a required {what} column '{column}'")]
    InvalidNullWrite { column: String, what: &'static str },

    /// The flat stream read from the physical layer does not correspond to
    /// the declared schema.
    #[error(
        "invalid input stream for column '{column}' at definition level {definition_level} \
         repetition level {repetition_level}: {message}"
    )]
    StreamCorruption {
        column: String,
        definition_level: DefinitionLevel,
        repetition_level: RepetitionLevel,
        message: String,
    },

    /// An argument or configuration value is out of range.
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    /// A physical value could not be converted into the logical type.
    #[error("cannot convert physical value to {target}: {message}")]
    Conversion {
        target: &'static str,
        message: String,
    },

    /// A record value did not match the type declared for its field.
    #[error("value does not match expected type: {expected} for field path: {path}")]
    ValueTypeMismatch { path: String, expected: String },

    /// A record struct holds a property which its schema does not define.
    #[error("property '{property}' is not defined in struct at path: {path}")]
    UnknownProperty { property: String, path: String },

    /// A record struct holds the same property twice.
    #[error("duplicate property '{property}' in struct at path: {path}")]
    DuplicateProperty { property: String, path: String },

    /// A row group was closed before every column was written.
    #[error("Only {initialized} out of {total} columns are initialized")]
    IncompleteRowGroup { initialized: usize, total: usize },

    /// A writer was used again after a failed write left its columns
    /// holding part of a batch.
    #[error("column '{column}' is unusable after a failed write")]
    WriterFailed { column: String },

    /// Error raised by the physical reader or writer.
    #[error("physical layer error for column '{column}'")]
    Physical {
        column: String,
        #[source]
        source: PhysicalError,
    },
}

impl Error {
    pub fn unsupported_shape(column: impl Into<String>, message: impl Into<String>) -> Error {
        Error::UnsupportedShape {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn invalid_null_write(column: impl Into<String>, what: &'static str) -> Error {
        Error::InvalidNullWrite {
            column: column.into(),
            what,
        }
    }

    pub fn stream_corruption(
        column: impl Into<String>,
        definition_level: DefinitionLevel,
        repetition_level: RepetitionLevel,
        message: impl Into<String>,
    ) -> Error {
        Error::StreamCorruption {
            column: column.into(),
            definition_level,
            repetition_level,
            message: message.into(),
        }
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn conversion(target: &'static str, message: impl Into<String>) -> Error {
        Error::Conversion {
            target,
            message: message.into(),
        }
    }

    pub fn physical<E>(column: impl Into<String>, source: E) -> Error
    where
        E: Into<PhysicalError>,
    {
        Error::Physical {
            column: column.into(),
            source: source.into(),
        }
    }
}
