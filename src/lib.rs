//! A library which shreds nested values into flat columns by encoding
//! definition and repetition levels for each leaf value, and assembles the
//! nested values back from those levels. The definition and repetition
//! levels preserve the structural hierarchy of the encoded values, so the
//! original nesting, including the difference between null and empty lists,
//! is reconstructed exactly.
//!
//! # Design
//! The technique for column shredding is described in the paper:
//! [Dremel: Interactive Analysis of Web-Scale Datasets](https://static.googleusercontent.com/media/research.google.com/en//pubs/archive/36632.pdf).
//!
//! Lists and maps use the three level encoding of Parquet: an outer list
//! (or map) group, a repeated group and the element (or key, value) fields.
//!
//! Each leaf column is handled on its own. A [`shape::ColumnShape`] tree is
//! built once per column from its [`schema::ColumnDescriptor`], then drives
//! a [`shredder::ColumnShredder`] when writing and a
//! [`assembler::ColumnAssembler`] when reading. The [`record`] module puts
//! the columns of a whole schema back together.

#![warn(missing_debug_implementations)]

pub mod assembler;
pub mod common;
pub mod config;
pub mod convert;
pub mod cursor;
pub mod emitter;
pub mod error;
pub mod field;
pub mod levels;
pub mod memory;
pub mod physical;
pub mod record;
pub mod schema;
mod schema_iter;
pub mod schema_path;
pub mod shape;
pub mod shredder;
pub mod value;

pub use self::assembler::ColumnAssembler;
pub use self::common::{DefinitionLevel, Levels, RepetitionLevel};
pub use self::config::StreamOptions;
pub use self::error::{Error, Result};
pub use self::record::{RecordReader, RecordWriter, Value, ValueBuilder};
pub use self::schema::{ColumnDescriptor, Schema, SchemaBuilder, SchemaFrame};
pub use self::schema_iter::SchemaLeafIterator;
pub use self::shape::{ColumnShape, LogicalShape, ShapeCache};
pub use self::shredder::ColumnShredder;
pub use self::value::LogicalValue;
