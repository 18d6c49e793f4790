//! Writes nested records by shredding them into every leaf column of a
//! schema.

use crate::config::StreamOptions;
use crate::error::{Error, Result};
use crate::field::{DataType, Field, MAP_KEY_NAME};
use crate::physical::{ColumnWriter, PhysicalValue};
use crate::record::value::Value;
use crate::schema::Schema;
use crate::schema_path::ColumnPath;
use crate::shape::ShapeCache;
use crate::shredder::ColumnShredder;
use crate::value::LogicalValue;
use bytes::Bytes;
use log::debug;
use std::collections::HashSet;

/// Checks that every struct property names a field of its struct, once.
fn check_struct(fields: &[Field], props: &[(String, Value)], path: &ColumnPath) -> Result<()> {
    let mut seen = HashSet::new();
    for (name, value) in props {
        if !seen.insert(name.as_str()) {
            return Err(Error::DuplicateProperty {
                property: name.clone(),
                path: path.to_string(),
            });
        }
        let field = fields
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| Error::UnknownProperty {
                property: name.clone(),
                path: path.to_string(),
            })?;
        check_properties(field.data_type(), value, &path.append_name(name))?;
    }
    Ok(())
}

fn check_properties(data_type: &DataType, value: &Value, path: &ColumnPath) -> Result<()> {
    match (data_type, value) {
        (DataType::Struct(fields), Value::Struct(props)) => check_struct(fields, props, path),
        (DataType::List(element), Value::List(items)) => items
            .iter()
            .try_for_each(|item| check_properties(element.data_type(), item, path)),
        (DataType::Map(key, value), Value::Map(entries)) => entries.iter().try_for_each(|(k, v)| {
            check_properties(key.data_type(), k, path)?;
            check_properties(value.data_type(), v, path)
        }),
        _ => Ok(()),
    }
}

fn type_mismatch(column: &ColumnPath, data_type: &DataType) -> Error {
    Error::ValueTypeMismatch {
        path: column.to_string(),
        expected: data_type.type_label(),
    }
}

fn to_physical(value: &Value) -> Option<PhysicalValue> {
    Some(match value {
        Value::Boolean(v) => PhysicalValue::Boolean(*v),
        Value::Int32(v) => PhysicalValue::Int32(*v),
        Value::Int64(v) => PhysicalValue::Int64(*v),
        Value::Float(v) => PhysicalValue::Float(*v),
        Value::Double(v) => PhysicalValue::Double(*v),
        Value::String(v) => PhysicalValue::ByteArray(Bytes::copy_from_slice(v.as_bytes())),
        Value::Binary(v) => PhysicalValue::ByteArray(Bytes::copy_from_slice(v)),
        Value::Null | Value::List(_) | Value::Map(_) | Value::Struct(_) => return None,
    })
}

/// Projects the value of `field` onto the column whose remaining path
/// components below the field are `rest`.
///
/// A missing list or map which is required projects to an empty list.
fn project(
    field: &Field,
    value: Option<&Value>,
    rest: &[String],
    column: &ColumnPath,
) -> Result<LogicalValue<PhysicalValue>> {
    let value = match value {
        None if !field.is_optional() && field.data_type().is_repeated() => {
            return Ok(LogicalValue::List(vec![]))
        }
        None | Some(Value::Null) => return Ok(LogicalValue::Null),
        Some(value) => value,
    };
    if !value.matches_type(field.data_type()) {
        return Err(type_mismatch(column, field.data_type()));
    }

    match (field.data_type(), value) {
        (DataType::Struct(fields), Value::Struct(props)) => {
            let (name, rest) = rest
                .split_first()
                .ok_or_else(|| type_mismatch(column, field.data_type()))?;
            let child = fields
                .iter()
                .find(|f| f.name() == name)
                .ok_or_else(|| type_mismatch(column, field.data_type()))?;
            let member = props.iter().find(|(k, _)| k == name).map(|(_, v)| v);
            Ok(LogicalValue::nested(project(child, member, rest, column)?))
        }
        (DataType::List(element), Value::List(items)) => {
            let rest = rest.get(2..).unwrap_or_default();
            items
                .iter()
                .map(|item| project(element, Some(item), rest, column))
                .collect::<Result<Vec<_>>>()
                .map(LogicalValue::List)
        }
        (DataType::Map(key, value), Value::Map(entries)) => {
            let is_key = rest.get(1).map(String::as_str) == Some(MAP_KEY_NAME);
            let target = if is_key { key } else { value };
            let rest = rest.get(2..).unwrap_or_default();
            entries
                .iter()
                .map(|(k, v)| project(target, Some(if is_key { k } else { v }), rest, column))
                .collect::<Result<Vec<_>>>()
                .map(LogicalValue::List)
        }
        (data_type, scalar) => to_physical(scalar)
            .map(LogicalValue::Scalar)
            .ok_or_else(|| type_mismatch(column, data_type)),
    }
}

/// Projects a record onto one leaf column.
pub(crate) fn project_record(
    fields: &[Field],
    record: &Value,
    column: &ColumnPath,
) -> Result<LogicalValue<PhysicalValue>> {
    let Value::Struct(props) = record else {
        return Err(Error::ValueTypeMismatch {
            path: ColumnPath::default().to_string(),
            expected: "Struct".to_string(),
        });
    };
    let (name, rest) = column
        .split_first()
        .ok_or_else(|| Error::invalid_arg("column", "column path is empty"))?;
    let field = fields
        .iter()
        .find(|f| f.name() == name)
        .ok_or_else(|| Error::invalid_arg("column", format!("{column} is not in the schema")))?;
    let member = props.iter().find(|(k, _)| k == name).map(|(_, v)| v);
    project(field, member, rest, column)
}

/// Shreds batches of records into one physical writer per leaf column.
///
/// A batch is written to every column or to none: records are checked and
/// projected onto every column before the first level is emitted.
#[derive(Debug)]
pub struct RecordWriter<W> {
    schema: Schema,
    columns: Vec<ColumnShredder<PhysicalValue, W>>,
    records_written: usize,
    failed_column: Option<String>,
}

impl<W: ColumnWriter<PhysicalValue>> RecordWriter<W> {
    /// Opens a writer with one physical writer per leaf column, in the
    /// depth-first order of [`Schema::columns`].
    pub fn new(
        schema: Schema,
        writers: Vec<W>,
        cache: &mut ShapeCache,
        options: &StreamOptions,
    ) -> Result<Self> {
        let descriptors = schema.columns()?;
        if writers.len() != descriptors.len() {
            return Err(Error::invalid_arg(
                "writers",
                format!(
                    "{} writers for {} columns of schema {}",
                    writers.len(),
                    descriptors.len(),
                    schema.name()
                ),
            ));
        }

        let columns = descriptors
            .iter()
            .zip(writers)
            .map(|(descriptor, writer)| {
                ColumnShredder::new(cache.get_or_build(descriptor)?, writer, options)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Opened record writer for schema {} with {} columns",
            schema.name(),
            columns.len()
        );

        Ok(Self {
            schema,
            columns,
            records_written: 0,
            failed_column: None,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Writes a batch of records. Returns the count of records written.
    ///
    /// After a physical writer error, columns before the failing one hold
    /// the batch while later ones do not, so every later call fails.
    pub fn write_batch(&mut self, records: &[Value]) -> Result<usize> {
        self.check_usable()?;
        let root = ColumnPath::default();
        for record in records {
            match record {
                Value::Struct(props) => check_struct(self.schema.fields(), props, &root)?,
                _ => {
                    return Err(Error::ValueTypeMismatch {
                        path: root.to_string(),
                        expected: "Struct".to_string(),
                    })
                }
            }
        }

        let projected = self
            .columns
            .iter()
            .map(|shredder| {
                let column = shredder.shape().descriptor().path();
                records
                    .iter()
                    .map(|record| project_record(self.schema.fields(), record, column))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        for (shredder, values) in self.columns.iter().zip(&projected) {
            shredder.validate(values)?;
        }
        for (shredder, values) in self.columns.iter_mut().zip(&projected) {
            if let Err(e) = shredder.write_batch(values) {
                self.failed_column = Some(shredder.shape().descriptor().path().to_string());
                return Err(e);
            }
        }

        self.records_written += records.len();
        Ok(records.len())
    }

    fn check_usable(&self) -> Result<()> {
        match &self.failed_column {
            Some(column) => Err(Error::WriterFailed {
                column: column.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Flushes every column and returns the physical writers.
    ///
    /// Fails after a failed write.
    pub fn close(self) -> Result<Vec<W>> {
        self.check_usable()?;
        debug!(
            "Closing record writer for schema {} after {} records",
            self.schema.name(),
            self.records_written
        );
        self.columns
            .into_iter()
            .map(ColumnShredder::close)
            .collect()
    }
}
