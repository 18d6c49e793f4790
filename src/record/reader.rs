//! Reads nested records by assembling every leaf column of a schema and
//! merging the column values back together.

use crate::assembler::ColumnAssembler;
use crate::config::StreamOptions;
use crate::error::{Error, Result};
use crate::field::{DataType, Field};
use crate::physical::{ColumnReader, PhysicalValue};
use crate::record::value::Value;
use crate::schema::Schema;
use crate::shape::ShapeCache;
use crate::value::LogicalValue;
use log::debug;

type ColumnValue = LogicalValue<PhysicalValue>;

fn leaf_count(field: &Field) -> usize {
    match field.data_type() {
        DataType::Struct(fields) => fields.iter().map(leaf_count).sum(),
        DataType::List(element) => leaf_count(element),
        DataType::Map(key, value) => leaf_count(key) + leaf_count(value),
        _ => 1,
    }
}

fn mismatch(field: &Field, message: impl Into<String>) -> Error {
    Error::stream_corruption(field.name(), 0, 0, message)
}

fn to_value(field: &Field, physical: PhysicalValue) -> Result<Value> {
    Ok(match (field.data_type(), physical) {
        (DataType::Boolean, PhysicalValue::Boolean(v)) => Value::Boolean(v),
        (DataType::Int32, PhysicalValue::Int32(v)) => Value::Int32(v),
        (DataType::Int64, PhysicalValue::Int64(v)) => Value::Int64(v),
        (DataType::Float, PhysicalValue::Float(v)) => Value::Float(v),
        (DataType::Double, PhysicalValue::Double(v)) => Value::Double(v),
        (DataType::String, PhysicalValue::ByteArray(v)) => Value::String(
            String::from_utf8(v.to_vec()).map_err(|e| Error::conversion("String", e.to_string()))?,
        ),
        (DataType::Binary, PhysicalValue::ByteArray(v)) => Value::Binary(v.to_vec()),
        (data_type, physical) => {
            return Err(Error::conversion(
                "Value",
                format!(
                    "{} value found in {} field '{}'",
                    physical.physical_type(),
                    data_type.type_label(),
                    field.name()
                ),
            ))
        }
    })
}

/// Unwraps the items of every list column, which must all be present and
/// of equal length, into one column group per element.
fn transpose(field: &Field, columns: Vec<ColumnValue>) -> Result<Vec<Vec<ColumnValue>>> {
    let mut len = None;
    let mut iters = Vec::with_capacity(columns.len());
    for column in columns {
        let items = match column {
            LogicalValue::List(items) => items,
            other => {
                return Err(mismatch(
                    field,
                    format!("{} found where columns hold a list", other.variant_label()),
                ))
            }
        };
        if *len.get_or_insert(items.len()) != items.len() {
            return Err(mismatch(field, "list columns hold different element counts"));
        }
        iters.push(items.into_iter());
    }

    Ok((0..len.unwrap_or(0))
        .map(|_| iters.iter_mut().filter_map(Iterator::next).collect())
        .collect())
}

/// Merges the values of every leaf column below `field`, in schema order,
/// into one record value.
fn merge(field: &Field, columns: Vec<ColumnValue>) -> Result<Value> {
    let Some(first) = columns.first() else {
        // A struct without leaf columns.
        return Ok(if field.is_optional() {
            Value::Null
        } else {
            Value::Struct(vec![])
        });
    };
    if first.is_null() {
        if columns.iter().any(|c| !c.is_null()) {
            return Err(mismatch(field, "columns disagree on a null value"));
        }
        return Ok(Value::Null);
    }

    match field.data_type() {
        DataType::Struct(children) => {
            let mut members = columns.into_iter().map(|column| match column {
                LogicalValue::Struct(member) => Ok(*member),
                other => Err(mismatch(
                    field,
                    format!("{} found where columns hold a struct", other.variant_label()),
                )),
            });
            let mut props = Vec::with_capacity(children.len());
            for child in children {
                let child_columns = members
                    .by_ref()
                    .take(leaf_count(child))
                    .collect::<Result<Vec<_>>>()?;
                props.push((child.name().to_string(), merge(child, child_columns)?));
            }
            Ok(Value::Struct(props))
        }
        DataType::List(element) => transpose(field, columns)?
            .into_iter()
            .map(|item| merge(element, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        DataType::Map(key, value) => transpose(field, columns)?
            .into_iter()
            .map(|mut entry| {
                let value_columns = entry.split_off(leaf_count(key).min(entry.len()));
                Ok((merge(key, entry)?, merge(value, value_columns)?))
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::Map),
        _ => match columns.into_iter().next() {
            Some(LogicalValue::Scalar(physical)) => to_value(field, physical),
            Some(other) => Err(mismatch(
                field,
                format!("{} found where a leaf value is expected", other.variant_label()),
            )),
            None => Ok(Value::Null),
        },
    }
}

/// Assembles batches of records from one physical reader per leaf column.
#[derive(Debug)]
pub struct RecordReader<R> {
    schema: Schema,
    columns: Vec<ColumnAssembler<PhysicalValue, R>>,
    records_read: usize,
}

impl<R: ColumnReader<PhysicalValue>> RecordReader<R> {
    /// Opens a reader with one physical reader per leaf column, in the
    /// depth-first order of [`Schema::columns`].
    pub fn new(
        schema: Schema,
        readers: Vec<R>,
        cache: &mut ShapeCache,
        options: &StreamOptions,
    ) -> Result<Self> {
        let descriptors = schema.columns()?;
        if readers.len() != descriptors.len() {
            return Err(Error::invalid_arg(
                "readers",
                format!(
                    "{} readers for {} columns of schema {}",
                    readers.len(),
                    descriptors.len(),
                    schema.name()
                ),
            ));
        }

        let columns = descriptors
            .iter()
            .zip(readers)
            .map(|(descriptor, reader)| {
                ColumnAssembler::new(cache.get_or_build(descriptor)?, reader, options)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Opened record reader for schema {} with {} columns",
            schema.name(),
            columns.len()
        );

        Ok(Self {
            schema,
            columns,
            records_read: 0,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Checks if at least one more record can be read.
    pub fn has_next(&mut self) -> Result<bool> {
        match self.columns.first_mut() {
            Some(column) => column.has_next(),
            None => Ok(false),
        }
    }

    /// Reads up to `max_records` records.
    pub fn read_batch(&mut self, max_records: usize) -> Result<Vec<Value>> {
        let batches = self
            .columns
            .iter_mut()
            .map(|column| column.read_batch(max_records))
            .collect::<Result<Vec<_>>>()?;

        let rows = batches.first().map_or(0, Vec::len);
        if let Some((i, batch)) = batches.iter().enumerate().find(|(_, b)| b.len() != rows) {
            let descriptor = self.columns[i].shape().descriptor();
            return Err(Error::stream_corruption(
                descriptor.path().to_string(),
                0,
                0,
                format!("column holds {} rows, expected {rows}", batch.len()),
            ));
        }

        let mut iters = batches.into_iter().map(Vec::into_iter).collect::<Vec<_>>();
        let mut records = Vec::with_capacity(rows);
        for _ in 0..rows {
            let mut row = iters.iter_mut().filter_map(Iterator::next);
            let mut props = Vec::with_capacity(self.schema.fields().len());
            for field in self.schema.fields() {
                let columns = row.by_ref().take(leaf_count(field)).collect();
                props.push((field.name().to_string(), merge(field, columns)?));
            }
            records.push(Value::Struct(props));
        }

        self.records_read += records.len();
        Ok(records)
    }

    /// Returns the physical readers.
    pub fn into_inner(self) -> Vec<R> {
        self.columns
            .into_iter()
            .map(ColumnAssembler::into_inner)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{element, integer, optional_list, string};
    use bytes::Bytes;

    fn bytes(s: &'static str) -> ColumnValue {
        LogicalValue::scalar(PhysicalValue::ByteArray(Bytes::from_static(s.as_bytes())))
    }

    #[test]
    fn test_leaf_count() {
        let doc = crate::schema::test_utils::create_doc();
        let counts = doc.fields().iter().map(leaf_count).collect::<Vec<_>>();
        assert_eq!(counts, vec![1, 2, 3]);
    }

    #[test]
    fn test_merge_list_of_structs() {
        let field = optional_list(
            "people",
            element(DataType::Struct(vec![string("name"), integer("age")]), false),
        );
        let columns = vec![
            LogicalValue::list([
                LogicalValue::nested(bytes("Ada")),
                LogicalValue::nested(bytes("Alan")),
            ]),
            LogicalValue::list([
                LogicalValue::nested(LogicalValue::scalar(PhysicalValue::Int64(36))),
                LogicalValue::nested(LogicalValue::scalar(PhysicalValue::Int64(41))),
            ]),
        ];

        assert_eq!(
            merge(&field, columns).unwrap(),
            Value::List(vec![
                Value::Struct(vec![
                    ("name".to_string(), Value::from("Ada")),
                    ("age".to_string(), Value::Int64(36)),
                ]),
                Value::Struct(vec![
                    ("name".to_string(), Value::from("Alan")),
                    ("age".to_string(), Value::Int64(41)),
                ]),
            ])
        );
    }

    #[test]
    fn test_merge_rejects_uneven_lists() {
        let field = optional_list(
            "pairs",
            element(DataType::Struct(vec![integer("a"), integer("b")]), false),
        );
        let columns = vec![
            LogicalValue::list([LogicalValue::nested(LogicalValue::scalar(
                PhysicalValue::Int64(1),
            ))]),
            LogicalValue::list([]),
        ];

        assert!(matches!(
            merge(&field, columns),
            Err(Error::StreamCorruption { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let field = string("name");
        let columns = vec![LogicalValue::scalar(PhysicalValue::ByteArray(
            Bytes::from_static(&[0xc3, 0x28]),
        ))];
        assert!(matches!(
            merge(&field, columns),
            Err(Error::Conversion { .. })
        ));
    }
}
