//! Shreds nested logical values of one column into definition levels,
//! repetition levels and leaf values.

use crate::common::{Levels, RepetitionLevel};
use crate::config::StreamOptions;
use crate::convert::{is_compatible, LeafType};
use crate::emitter::{BufferedEmitter, Slots};
use crate::error::{Error, Result};
use crate::physical::ColumnWriter;
use crate::schema::ColumnDescriptor;
use crate::shape::{ColumnShape, LeafNode, ShapeNode};
use crate::value::LogicalValue;
use log::{debug, warn};
use std::marker::PhantomData;
use std::sync::Arc;

impl ShapeNode {
    fn label(&self) -> &'static str {
        match self {
            ShapeNode::Leaf(_) => "scalar",
            ShapeNode::RequiredStruct(_) | ShapeNode::OptionalStruct(_) => "struct",
            ShapeNode::List(_) => "list",
        }
    }

    fn mismatch<T>(&self, column: &str, value: &LogicalValue<T>) -> Error {
        Error::unsupported_shape(
            column,
            format!(
                "{} value written where the column expects a {}",
                value.variant_label(),
                self.label()
            ),
        )
    }

    /// Checks that `value` can be shredded without emitting anything.
    pub(crate) fn validate<T>(&self, value: &LogicalValue<T>, column: &str) -> Result<()> {
        match (self, value) {
            (ShapeNode::Leaf(leaf), LogicalValue::Null) if leaf.null_level.is_none() => {
                Err(Error::invalid_null_write(column, "scalar"))
            }
            (ShapeNode::Leaf(_), LogicalValue::Null | LogicalValue::Scalar(_)) => Ok(()),
            (ShapeNode::RequiredStruct(_), LogicalValue::Null) => {
                Err(Error::invalid_null_write(column, "struct"))
            }
            (ShapeNode::RequiredStruct(child), LogicalValue::Struct(inner)) => {
                child.validate(inner, column)
            }
            (ShapeNode::OptionalStruct(_), LogicalValue::Null) => Ok(()),
            (ShapeNode::OptionalStruct(node), LogicalValue::Struct(inner)) => {
                node.child.validate(inner, column)
            }
            (ShapeNode::List(list), LogicalValue::Null) if list.null_level.is_none() => {
                Err(Error::invalid_null_write(column, "array"))
            }
            (ShapeNode::List(_), LogicalValue::Null) => Ok(()),
            (ShapeNode::List(list), LogicalValue::List(items)) => items
                .iter()
                .try_for_each(|item| list.child.validate(item, column)),
            (node, value) => Err(node.mismatch(column, value)),
        }
    }

    /// Emits the levels and leaf values of `value`.
    ///
    /// `repetition` is the repetition level of the first emitted position:
    /// the level of the innermost list which is starting a new element.
    pub(crate) fn shred<T, W>(
        &self,
        value: &LogicalValue<T>,
        repetition: RepetitionLevel,
        emitter: &mut BufferedEmitter<T::Physical, W>,
        column: &str,
    ) -> Result<()>
    where
        T: LeafType,
        W: ColumnWriter<T::Physical>,
    {
        match (self, value) {
            (ShapeNode::Leaf(leaf), LogicalValue::Scalar(v)) => {
                emitter.push_value(Levels::new(leaf.value_level, repetition), v)
            }
            (ShapeNode::Leaf(leaf), LogicalValue::Null) => match leaf.null_level {
                Some(level) => emitter.push_null(Levels::new(level, repetition)),
                None => Err(Error::invalid_null_write(column, "scalar")),
            },
            (ShapeNode::RequiredStruct(child), LogicalValue::Struct(inner)) => {
                child.shred(inner, repetition, emitter, column)
            }
            (ShapeNode::RequiredStruct(_), LogicalValue::Null) => {
                Err(Error::invalid_null_write(column, "struct"))
            }
            (ShapeNode::OptionalStruct(node), LogicalValue::Struct(inner)) => {
                node.child.shred(inner, repetition, emitter, column)
            }
            (ShapeNode::OptionalStruct(node), LogicalValue::Null) => {
                emitter.push_null(Levels::new(node.null_level, repetition))
            }
            (ShapeNode::List(list), LogicalValue::Null) => match list.null_level {
                Some(level) => emitter.push_null(Levels::new(level, repetition)),
                None => Err(Error::invalid_null_write(column, "array")),
            },
            (ShapeNode::List(list), LogicalValue::List(items)) if items.is_empty() => {
                emitter.push_null(Levels::new(list.empty_level, repetition))
            }
            (ShapeNode::List(list), LogicalValue::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    let item_repetition = if i == 0 {
                        repetition
                    } else {
                        list.repetition_level
                    };
                    list.child.shred(item, item_repetition, emitter, column)?;
                }
                Ok(())
            }
            (node, value) => Err(node.mismatch(column, value)),
        }
    }
}

/// Writes batches of logical values of type `T` to one leaf column.
///
/// Every call either emits all of its values or none of them: values are
/// validated against the shape tree before the first level is buffered.
/// Buffered levels are flushed to the physical writer at the end of every
/// batch.
#[derive(Debug)]
pub struct ColumnShredder<T: LeafType, W> {
    shape: Arc<ColumnShape>,
    emitter: BufferedEmitter<T::Physical, W>,
    column: String,
    rows_written: usize,
    failed: bool,
    _leaf: PhantomData<T>,
}

impl<T, W> ColumnShredder<T, W>
where
    T: LeafType,
    W: ColumnWriter<T::Physical>,
{
    pub fn new(shape: Arc<ColumnShape>, writer: W, options: &StreamOptions) -> Result<Self> {
        options.validate()?;

        let column = shape.column_name();
        let descriptor = shape.descriptor();
        if !is_compatible::<T>(descriptor.physical_type()) {
            return Err(Error::unsupported_shape(
                column,
                format!(
                    "values of type {} cannot be stored in a {} column",
                    std::any::type_name::<T>(),
                    descriptor.physical_type()
                ),
            ));
        }

        let emitter = BufferedEmitter::new(
            writer,
            column.as_str(),
            descriptor.levels(),
            options.buffer_length,
        )?;

        debug!(
            "Opened shredder for column {} (shape: {}, buffer length: {})",
            column,
            shape.shape(),
            options.buffer_length
        );

        Ok(Self {
            shape,
            emitter,
            column,
            rows_written: 0,
            failed: false,
            _leaf: PhantomData,
        })
    }

    /// Opens a shredder for the canonical shape of `descriptor`.
    pub fn infer(descriptor: &ColumnDescriptor, writer: W, options: &StreamOptions) -> Result<Self> {
        let shape = Arc::new(ColumnShape::infer(descriptor.clone())?);
        Self::new(shape, writer, options)
    }

    pub fn shape(&self) -> &ColumnShape {
        &self.shape
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Checks that every value matches the shape of the column.
    pub fn validate(&self, values: &[LogicalValue<T>]) -> Result<()> {
        let root = self.shape.root();
        values
            .iter()
            .try_for_each(|value| root.validate(value, &self.column))
    }

    /// Shreds `values`, one top-level entry (row) each, and flushes.
    ///
    /// Returns the count of rows written.
    ///
    /// A physical writer error drops the positions still buffered, and
    /// fails every later call since earlier flushes may have written part
    /// of the batch.
    pub fn write_batch(&mut self, values: &[LogicalValue<T>]) -> Result<usize> {
        self.check_usable()?;
        self.validate(values)?;

        if let Err(e) = self.emit(values) {
            self.emitter.discard();
            self.failed = true;
            warn!(
                "Write to column {} failed after {} rows: {}",
                self.column, self.rows_written, e
            );
            return Err(e);
        }

        self.rows_written += values.len();
        Ok(values.len())
    }

    /// Checks if the shredder can still write. False after a failed write.
    pub fn is_usable(&self) -> bool {
        !self.failed
    }

    fn check_usable(&self) -> Result<()> {
        if self.failed {
            return Err(Error::WriterFailed {
                column: self.column.clone(),
            });
        }
        Ok(())
    }

    fn emit(&mut self, values: &[LogicalValue<T>]) -> Result<()> {
        match self.shape.root() {
            ShapeNode::Leaf(leaf) => {
                let leaf = *leaf;
                self.write_leaf_run(leaf, values)?
            }
            root => {
                for value in values {
                    root.shred(value, 0, &mut self.emitter, &self.column)?;
                }
            }
        }
        self.emitter.flush()
    }

    /// Writes a column without nesting in chunks of the buffer capacity.
    fn write_leaf_run(&mut self, leaf: LeafNode, values: &[LogicalValue<T>]) -> Result<()> {
        let null_level = leaf.null_level.unwrap_or(leaf.value_level);

        for chunk in values.chunks(self.emitter.capacity()) {
            let Slots {
                mut def_levels,
                values: slots,
                bytes,
                ..
            } = self.emitter.reserve(chunk.len())?;

            let mut n_values = 0;
            for (i, value) in chunk.iter().enumerate() {
                let level = match value {
                    LogicalValue::Scalar(v) => {
                        slots[n_values] = v.to_physical(bytes);
                        n_values += 1;
                        leaf.value_level
                    }
                    _ => null_level,
                };
                if let Some(def) = def_levels.as_deref_mut() {
                    def[i] = level;
                }
            }

            self.emitter.advance(chunk.len(), n_values);
        }
        Ok(())
    }

    /// Flushes buffered levels and returns the physical writer.
    ///
    /// Fails after a failed write, since the column holds part of a batch.
    pub fn close(self) -> Result<W> {
        self.check_usable()?;
        debug!(
            "Closing shredder for column {} after {} rows",
            self.column, self.rows_written
        );
        self.emitter.into_inner()
    }
}
