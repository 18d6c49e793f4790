//! Reassembles nested logical values of one column from definition levels,
//! repetition levels and leaf values.

use crate::common::Levels;
use crate::config::StreamOptions;
use crate::convert::{is_compatible, LeafType};
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::physical::ColumnReader;
use crate::schema::ColumnDescriptor;
use crate::shape::{ColumnShape, ShapeNode};
use crate::value::LogicalValue;
use log::debug;
use std::marker::PhantomData;
use std::sync::Arc;

fn corruption(column: &str, levels: Levels, message: impl Into<String>) -> Error {
    Error::stream_corruption(column, levels.definition, levels.repetition, message)
}

/// Returns the levels of the current position, which must exist.
fn expect_levels<P, R>(cursor: &mut Cursor<P, R>) -> Result<Levels>
where
    P: Clone + Default,
    R: ColumnReader<P>,
{
    cursor.peek()?.ok_or_else(|| {
        Error::stream_corruption(
            cursor.column(),
            cursor.max_definition_level(),
            0,
            "column ended inside a nested value",
        )
    })
}

impl ShapeNode {
    /// Reads one value of this node, consuming every position it spans.
    pub(crate) fn assemble<T, R>(&self, cursor: &mut Cursor<T::Physical, R>) -> Result<LogicalValue<T>>
    where
        T: LeafType,
        R: ColumnReader<T::Physical>,
    {
        let levels = expect_levels(cursor)?;
        if levels.definition < self.min_definition_level() {
            return Err(corruption(
                cursor.column(),
                levels,
                format!(
                    "definition level is below the minimum {} of a {}",
                    self.min_definition_level(),
                    self.label_for_read()
                ),
            ));
        }

        match self {
            ShapeNode::Leaf(leaf) => {
                let value = if levels.definition >= leaf.value_level {
                    let physical = cursor.read_value(levels)?;
                    LogicalValue::Scalar(T::from_physical(&physical)?)
                } else {
                    LogicalValue::Null
                };
                cursor.advance();
                Ok(value)
            }
            ShapeNode::RequiredStruct(child) => Ok(LogicalValue::nested(child.assemble(cursor)?)),
            ShapeNode::OptionalStruct(node) => {
                if levels.definition == node.null_level {
                    cursor.advance();
                    Ok(LogicalValue::Null)
                } else {
                    Ok(LogicalValue::nested(node.child.assemble(cursor)?))
                }
            }
            ShapeNode::List(list) => {
                if Some(levels.definition) == list.null_level {
                    cursor.advance();
                    return Ok(LogicalValue::Null);
                }
                if levels.definition == list.empty_level {
                    cursor.advance();
                    return Ok(LogicalValue::List(vec![]));
                }

                let mut items = vec![list.child.assemble(cursor)?];
                while let Some(next) = cursor.peek()? {
                    if next.repetition < list.repetition_level {
                        break;
                    }
                    if next.repetition > list.repetition_level {
                        return Err(corruption(
                            cursor.column(),
                            next,
                            format!(
                                "repetition level is deeper than the innermost list at level {}",
                                list.repetition_level
                            ),
                        ));
                    }
                    items.push(list.child.assemble(cursor)?);
                }
                Ok(LogicalValue::List(items))
            }
        }
    }

    fn label_for_read(&self) -> &'static str {
        match self {
            ShapeNode::Leaf(_) => "leaf",
            ShapeNode::RequiredStruct(_) => "required struct",
            ShapeNode::OptionalStruct(_) => "optional struct",
            ShapeNode::List(_) => "list",
        }
    }
}

/// Reads batches of logical values of type `T` from one leaf column.
///
/// A column without nesting whose leaf is required is read in bulk when
/// `T` converts from the physical type by plain copy.
#[derive(Debug)]
pub struct ColumnAssembler<T: LeafType, R> {
    shape: Arc<ColumnShape>,
    cursor: Cursor<T::Physical, R>,
    direct: bool,
    rows_read: usize,
    _leaf: PhantomData<T>,
}

impl<T, R> ColumnAssembler<T, R>
where
    T: LeafType,
    R: ColumnReader<T::Physical>,
{
    pub fn new(shape: Arc<ColumnShape>, reader: R, options: &StreamOptions) -> Result<Self> {
        options.validate()?;

        let column = shape.column_name();
        let descriptor = shape.descriptor();
        if !is_compatible::<T>(descriptor.physical_type()) {
            return Err(Error::unsupported_shape(
                column,
                format!(
                    "values of type {} cannot be read from a {} column",
                    std::any::type_name::<T>(),
                    descriptor.physical_type()
                ),
            ));
        }

        let direct = T::DIRECT
            && matches!(shape.root(), ShapeNode::Leaf(leaf) if leaf.null_level.is_none());
        let cursor = Cursor::new(
            reader,
            column.as_str(),
            descriptor.levels(),
            options.buffer_length,
        )?;

        debug!(
            "Opened assembler for column {} (shape: {}, direct: {}, buffer length: {})",
            column,
            shape.shape(),
            direct,
            options.buffer_length
        );

        Ok(Self {
            shape,
            cursor,
            direct,
            rows_read: 0,
            _leaf: PhantomData,
        })
    }

    /// Opens an assembler for the canonical shape of `descriptor`.
    pub fn infer(descriptor: &ColumnDescriptor, reader: R, options: &StreamOptions) -> Result<Self> {
        let shape = Arc::new(ColumnShape::infer(descriptor.clone())?);
        Self::new(shape, reader, options)
    }

    pub fn shape(&self) -> &ColumnShape {
        &self.shape
    }

    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Checks if the bulk read path is used.
    pub fn is_direct(&self) -> bool {
        self.direct
    }

    /// Checks if at least one more top-level entry can be read.
    pub fn has_next(&mut self) -> Result<bool> {
        Ok(self.cursor.peek()?.is_some())
    }

    /// Reads the next top-level entry, or `None` at the end of the column.
    pub fn read_row(&mut self) -> Result<Option<LogicalValue<T>>> {
        let Some(levels) = self.cursor.peek()? else {
            return Ok(None);
        };
        if levels.repetition != 0 {
            return Err(corruption(
                self.cursor.column(),
                levels,
                "top-level entry does not start at repetition level 0",
            ));
        }

        let value = self.shape.root().assemble(&mut self.cursor)?;
        self.rows_read += 1;
        Ok(Some(value))
    }

    /// Reads up to `max_rows` top-level entries. Fewer are returned only at
    /// the end of the column.
    pub fn read_batch(&mut self, max_rows: usize) -> Result<Vec<LogicalValue<T>>> {
        if self.direct {
            return self.read_direct(max_rows);
        }

        let mut rows = vec![];
        while rows.len() < max_rows {
            match self.read_row()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    /// Reads exactly `rows` top-level entries.
    pub fn read_all(&mut self, rows: usize) -> Result<Vec<LogicalValue<T>>> {
        let values = self.read_batch(rows)?;
        if values.len() < rows {
            return Err(Error::invalid_arg(
                "rows",
                format!(
                    "column {} holds {} more rows, {} requested",
                    self.shape.descriptor().path(),
                    values.len(),
                    rows
                ),
            ));
        }
        Ok(values)
    }

    fn read_direct(&mut self, max_rows: usize) -> Result<Vec<LogicalValue<T>>> {
        let mut physical = vec![];
        while physical.len() < max_rows {
            if self.cursor.read_direct(max_rows - physical.len(), &mut physical)? == 0 {
                break;
            }
        }

        let rows = physical
            .iter()
            .map(|p| T::from_physical(p).map(LogicalValue::Scalar))
            .collect::<Result<Vec<_>>>()?;
        self.rows_read += rows.len();
        Ok(rows)
    }

    /// Returns the physical reader.
    pub fn into_inner(self) -> R {
        self.cursor.into_inner()
    }
}

impl<T, R> Iterator for ColumnAssembler<T, R>
where
    T: LeafType,
    R: ColumnReader<T::Physical>,
{
    type Item = Result<LogicalValue<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_row().transpose()
    }
}
