//! In-memory physical columns and row groups.

use crate::common::{DefinitionLevel, RepetitionLevel};
use crate::error::{Error, Result};
use crate::physical::{ColumnReader, ColumnWriter};
use crate::schema::{ColumnDescriptor, Schema};
use log::warn;

/// A leaf column held in memory, readable and writable through the
/// physical batch contracts.
///
/// Level vectors stay empty for levels the column does not store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryColumn<P> {
    max_definition_level: DefinitionLevel,
    max_repetition_level: RepetitionLevel,
    def_levels: Vec<DefinitionLevel>,
    rep_levels: Vec<RepetitionLevel>,
    values: Vec<P>,
    write_batches: usize,
    level_position: usize,
    value_position: usize,
}

impl<P: Clone> MemoryColumn<P> {
    pub fn new(max_definition_level: DefinitionLevel, max_repetition_level: RepetitionLevel) -> Self {
        Self {
            max_definition_level,
            max_repetition_level,
            def_levels: vec![],
            rep_levels: vec![],
            values: vec![],
            write_batches: 0,
            level_position: 0,
            value_position: 0,
        }
    }

    pub fn for_descriptor(descriptor: &ColumnDescriptor) -> Self {
        Self::new(
            descriptor.max_definition_level(),
            descriptor.max_repetition_level(),
        )
    }

    /// Creates a column holding the given stream, as if already written.
    pub fn from_parts(
        max_definition_level: DefinitionLevel,
        max_repetition_level: RepetitionLevel,
        def_levels: Vec<DefinitionLevel>,
        rep_levels: Vec<RepetitionLevel>,
        values: Vec<P>,
    ) -> Self {
        Self {
            def_levels,
            rep_levels,
            values,
            ..Self::new(max_definition_level, max_repetition_level)
        }
    }

    pub fn definition_levels(&self) -> &[DefinitionLevel] {
        &self.def_levels
    }

    pub fn repetition_levels(&self) -> &[RepetitionLevel] {
        &self.rep_levels
    }

    pub fn values(&self) -> &[P] {
        &self.values
    }

    /// Returns the count of stored positions.
    pub fn num_levels(&self) -> usize {
        if self.max_definition_level > 0 {
            self.def_levels.len()
        } else {
            self.values.len()
        }
    }

    /// Returns the count of successful `write_batch` calls.
    pub fn write_batches(&self) -> usize {
        self.write_batches
    }

    /// Checks if at least one batch was written to this column.
    pub fn is_initialized(&self) -> bool {
        self.write_batches > 0
    }

    /// Returns every position as `(definition, repetition, value)`.
    pub fn triples(&self) -> Vec<(DefinitionLevel, RepetitionLevel, Option<P>)> {
        let mut values = self.values.iter();
        (0..self.num_levels())
            .map(|i| {
                let def = self
                    .def_levels
                    .get(i)
                    .copied()
                    .unwrap_or(self.max_definition_level);
                let rep = self.rep_levels.get(i).copied().unwrap_or(0);
                let value = if def == self.max_definition_level {
                    values.next().cloned()
                } else {
                    None
                };
                (def, rep, value)
            })
            .collect()
    }

    /// Moves the read position back to the first level.
    pub fn rewind(&mut self) {
        self.level_position = 0;
        self.value_position = 0;
    }
}

impl<P: Clone> ColumnWriter<P> for MemoryColumn<P> {
    fn write_batch(
        &mut self,
        def_levels: Option<&[DefinitionLevel]>,
        rep_levels: Option<&[RepetitionLevel]>,
        values: &[P],
    ) -> Result<()> {
        let has_def = self.max_definition_level > 0;
        let has_rep = self.max_repetition_level > 0;
        if def_levels.is_some() != has_def || rep_levels.is_some() != has_rep {
            return Err(Error::invalid_arg(
                "levels",
                format!(
                    "column stores definition levels: {has_def}, repetition levels: {has_rep}"
                ),
            ));
        }

        if let Some(def) = def_levels {
            if let Some(rep) = rep_levels {
                if rep.len() != def.len() {
                    return Err(Error::invalid_arg(
                        "rep_levels",
                        format!("{} repetition levels for {} positions", rep.len(), def.len()),
                    ));
                }
            }
            let present = def
                .iter()
                .filter(|&&d| d == self.max_definition_level)
                .count();
            if present != values.len() {
                return Err(Error::invalid_arg(
                    "values",
                    format!("{} values for {present} present positions", values.len()),
                ));
            }
            self.def_levels.extend_from_slice(def);
        }
        if let Some(rep) = rep_levels {
            self.rep_levels.extend_from_slice(rep);
        }
        self.values.extend_from_slice(values);
        self.write_batches += 1;
        Ok(())
    }
}

impl<P: Clone> ColumnReader<P> for MemoryColumn<P> {
    fn read_batch(
        &mut self,
        batch_size: usize,
        def_levels: Option<&mut [DefinitionLevel]>,
        rep_levels: Option<&mut [RepetitionLevel]>,
        values: &mut [P],
    ) -> Result<(usize, usize)> {
        let start = self.level_position;
        let n = batch_size
            .min(self.num_levels().saturating_sub(start))
            .min(values.len());

        let values_read = match def_levels {
            Some(def) => {
                let batch = self.def_levels.get(start..start + n).ok_or_else(|| {
                    Error::invalid_arg("def_levels", "column stores no definition levels")
                })?;
                def[..n].copy_from_slice(batch);
                batch
                    .iter()
                    .filter(|&&d| d == self.max_definition_level)
                    .count()
            }
            None => n,
        };
        if let Some(rep) = rep_levels {
            let batch = self.rep_levels.get(start..start + n).ok_or_else(|| {
                Error::invalid_arg("rep_levels", "column stores no repetition levels")
            })?;
            rep[..n].copy_from_slice(batch);
        }

        // A truncated value vector yields fewer values than present levels.
        let available = self.values.len().saturating_sub(self.value_position);
        let values_read = values_read.min(available);
        values[..values_read].clone_from_slice(
            &self.values[self.value_position..self.value_position + values_read],
        );

        self.level_position += n;
        self.value_position += values_read;
        Ok((values_read, n))
    }
}

/// A row group of in-memory columns, one per leaf of a schema.
#[derive(Debug, Clone)]
pub struct MemoryRowGroup<P> {
    descriptors: Vec<ColumnDescriptor>,
    columns: Vec<MemoryColumn<P>>,
}

impl<P: Clone> MemoryRowGroup<P> {
    pub fn new(descriptors: Vec<ColumnDescriptor>) -> Self {
        let columns = descriptors.iter().map(MemoryColumn::for_descriptor).collect();
        Self {
            descriptors,
            columns,
        }
    }

    pub fn from_schema(schema: &Schema) -> Result<Self> {
        Ok(Self::new(schema.columns()?))
    }

    pub fn descriptors(&self) -> &[ColumnDescriptor] {
        &self.descriptors
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, i: usize) -> Option<&MemoryColumn<P>> {
        self.columns.get(i)
    }

    pub fn column_mut(&mut self, i: usize) -> Option<&mut MemoryColumn<P>> {
        self.columns.get_mut(i)
    }

    /// Returns mutable handles to every column, in schema leaf order.
    pub fn columns_mut(&mut self) -> Vec<&mut MemoryColumn<P>> {
        self.columns.iter_mut().collect()
    }

    /// Moves every column's read position back to the start.
    pub fn rewind(&mut self) {
        self.columns.iter_mut().for_each(MemoryColumn::rewind);
    }

    /// Closes the row group, failing unless every column was written.
    pub fn close(self) -> Result<Vec<MemoryColumn<P>>> {
        let total = self.columns.len();
        let initialized = self
            .columns
            .iter()
            .filter(|column| column.is_initialized())
            .count();

        if initialized < total {
            warn!(
                "Closing row group with {} of {} columns initialized",
                initialized, total
            );
            return Err(Error::IncompleteRowGroup { initialized, total });
        }
        Ok(self.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let mut column = MemoryColumn::<i32>::new(2, 1);
        column
            .write_batch(Some(&[2, 1, 2]), Some(&[0, 0, 1]), &[5, 6])
            .unwrap();
        assert_eq!(
            column.triples(),
            vec![(2, 0, Some(5)), (1, 0, None), (2, 1, Some(6))]
        );

        let mut def = [0; 2];
        let mut rep = [0; 2];
        let mut values = [0; 2];
        let read = column
            .read_batch(2, Some(&mut def), Some(&mut rep), &mut values)
            .unwrap();
        assert_eq!(read, (1, 2));
        assert_eq!(def, [2, 1]);
        assert_eq!(values[0], 5);

        let read = column
            .read_batch(2, Some(&mut def), Some(&mut rep), &mut values)
            .unwrap();
        assert_eq!(read, (1, 1));
        assert_eq!(values[0], 6);

        let read = column
            .read_batch(2, Some(&mut def), Some(&mut rep), &mut values)
            .unwrap();
        assert_eq!(read, (0, 0), "End of column");
    }

    #[test]
    fn test_write_rejects_mismatched_values() {
        let mut column = MemoryColumn::<i32>::new(1, 0);
        assert!(column.write_batch(Some(&[1, 0]), None, &[]).is_err());
        assert!(column.write_batch(None, None, &[1]).is_err());
        assert!(!column.is_initialized());
    }

    #[test]
    fn test_incomplete_row_group() {
        let descriptors = crate::schema::test_utils::create_doc().columns().unwrap();
        let mut row_group = MemoryRowGroup::<crate::physical::PhysicalValue>::new(descriptors);
        assert_eq!(row_group.num_columns(), 6);

        if let Some(column) = row_group.column_mut(0) {
            column
                .write_batch(None, None, &[crate::physical::PhysicalValue::Int64(10)])
                .unwrap();
        }

        let err = row_group.close().unwrap_err();
        assert_eq!(err.to_string(), "Only 1 out of 6 columns are initialized");
    }
}
