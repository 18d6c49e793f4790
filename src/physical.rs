//! Physical value types and the batch contracts of the physical column layer.
//!
//! The physical layer owns encoding, compression and page I/O. This crate
//! only hands it flat batches of definition levels, repetition levels and
//! values, and pulls the same back when reading.

use crate::common::{DefinitionLevel, RepetitionLevel};
use crate::error::Result;
use bytes::Bytes;
use std::fmt::{self, Formatter};

/// Physical storage type of a leaf column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Boolean,
    Int32,
    Int64,
    Float,
    Double,
    ByteArray,
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            PhysicalType::Boolean => "Boolean",
            PhysicalType::Int32 => "Int32",
            PhysicalType::Int64 => "Int64",
            PhysicalType::Float => "Float",
            PhysicalType::Double => "Double",
            PhysicalType::ByteArray => "ByteArray",
        };
        write!(f, "{label}")
    }
}

/// A physical value of any [`PhysicalType`].
///
/// Used by callers which only learn the type of a column at runtime, such as
/// the record layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalValue {
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    ByteArray(Bytes),
}

impl PhysicalValue {
    pub fn physical_type(&self) -> PhysicalType {
        match self {
            PhysicalValue::Boolean(_) => PhysicalType::Boolean,
            PhysicalValue::Int32(_) => PhysicalType::Int32,
            PhysicalValue::Int64(_) => PhysicalType::Int64,
            PhysicalValue::Float(_) => PhysicalType::Float,
            PhysicalValue::Double(_) => PhysicalType::Double,
            PhysicalValue::ByteArray(_) => PhysicalType::ByteArray,
        }
    }
}

/// Placeholder used to pre-size value buffers.
impl Default for PhysicalValue {
    fn default() -> Self {
        PhysicalValue::Boolean(false)
    }
}

/// Writes flat batches of levels and values for a single leaf column.
pub trait ColumnWriter<P> {
    /// Writes one batch.
    ///
    /// `def_levels` and `rep_levels` are `None` when the column's maximum
    /// definition (respectively repetition) level is 0. When present, both
    /// slices hold one entry per position and `values` holds one entry per
    /// position whose definition level equals the maximum. When
    /// `def_levels` is `None` every position carries a value.
    fn write_batch(
        &mut self,
        def_levels: Option<&[DefinitionLevel]>,
        rep_levels: Option<&[RepetitionLevel]>,
        values: &[P],
    ) -> Result<()>;
}

/// Reads flat batches of levels and values for a single leaf column.
pub trait ColumnReader<P> {
    /// Reads up to `batch_size` positions.
    ///
    /// Fills the level buffers (when given) and `values`, and returns
    /// `(values_read, levels_read)`. Zero levels read signals the end of the
    /// column. Without a definition level buffer `values_read` equals
    /// `levels_read`.
    fn read_batch(
        &mut self,
        batch_size: usize,
        def_levels: Option<&mut [DefinitionLevel]>,
        rep_levels: Option<&mut [RepetitionLevel]>,
        values: &mut [P],
    ) -> Result<(usize, usize)>;
}

impl<P, W: ColumnWriter<P> + ?Sized> ColumnWriter<P> for &mut W {
    fn write_batch(
        &mut self,
        def_levels: Option<&[DefinitionLevel]>,
        rep_levels: Option<&[RepetitionLevel]>,
        values: &[P],
    ) -> Result<()> {
        (**self).write_batch(def_levels, rep_levels, values)
    }
}

impl<P, R: ColumnReader<P> + ?Sized> ColumnReader<P> for &mut R {
    fn read_batch(
        &mut self,
        batch_size: usize,
        def_levels: Option<&mut [DefinitionLevel]>,
        rep_levels: Option<&mut [RepetitionLevel]>,
        values: &mut [P],
    ) -> Result<(usize, usize)> {
        (**self).read_batch(batch_size, def_levels, rep_levels, values)
    }
}

impl<P, W: ColumnWriter<P> + ?Sized> ColumnWriter<P> for Box<W> {
    fn write_batch(
        &mut self,
        def_levels: Option<&[DefinitionLevel]>,
        rep_levels: Option<&[RepetitionLevel]>,
        values: &[P],
    ) -> Result<()> {
        (**self).write_batch(def_levels, rep_levels, values)
    }
}

impl<P, R: ColumnReader<P> + ?Sized> ColumnReader<P> for Box<R> {
    fn read_batch(
        &mut self,
        batch_size: usize,
        def_levels: Option<&mut [DefinitionLevel]>,
        rep_levels: Option<&mut [RepetitionLevel]>,
        values: &mut [P],
    ) -> Result<(usize, usize)> {
        (**self).read_batch(batch_size, def_levels, rep_levels, values)
    }
}
