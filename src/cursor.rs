//! Buffered, peekable reader over the flat level and value stream of one
//! leaf column.

use crate::common::{DefinitionLevel, Levels, RepetitionLevel};
use crate::error::{Error, Result};
use crate::levels::LevelPath;
use crate::physical::ColumnReader;
use log::trace;
use std::mem;

#[derive(Debug)]
pub struct Cursor<P, R> {
    reader: R,
    column: String,
    levels: LevelPath,
    batch_size: usize,
    def_levels: Option<Vec<DefinitionLevel>>,
    rep_levels: Option<Vec<RepetitionLevel>>,
    values: Vec<P>,
    levels_read: usize,
    values_read: usize,
    level_index: usize,
    value_index: usize,
    exhausted: bool,
}

impl<P, R> Cursor<P, R>
where
    P: Clone + Default,
    R: ColumnReader<P>,
{
    pub fn new(
        reader: R,
        column: impl Into<String>,
        levels: &LevelPath,
        batch_size: usize,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::invalid_arg(
                "batch_size",
                "read batch size must be at least 1",
            ));
        }

        Ok(Self {
            reader,
            column: column.into(),
            levels: levels.clone(),
            batch_size,
            def_levels: levels
                .has_definition_levels()
                .then(|| vec![0; batch_size]),
            rep_levels: levels
                .has_repetition_levels()
                .then(|| vec![0; batch_size]),
            values: vec![P::default(); batch_size],
            levels_read: 0,
            values_read: 0,
            level_index: 0,
            value_index: 0,
            exhausted: false,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn max_definition_level(&self) -> DefinitionLevel {
        self.levels.max_definition_level()
    }

    /// Returns the levels at the current position without consuming them,
    /// or `None` at the end of the column.
    ///
    /// Fails if either level lies outside the bounds of the column.
    pub fn peek(&mut self) -> Result<Option<Levels>> {
        if self.level_index == self.levels_read && !self.refill()? {
            return Ok(None);
        }

        let i = self.level_index;
        let levels = Levels::new(
            self.def_levels
                .as_ref()
                .map_or(self.levels.max_definition_level(), |levels| levels[i]),
            self.rep_levels.as_ref().map_or(0, |levels| levels[i]),
        );

        if !self.levels.contains(levels) {
            return Err(Error::stream_corruption(
                self.column.as_str(),
                levels.definition,
                levels.repetition,
                format!(
                    "levels exceed the column maximum (max def: {}, max rep: {})",
                    self.levels.max_definition_level(),
                    self.levels.max_repetition_level()
                ),
            ));
        }
        Ok(Some(levels))
    }

    /// Consumes the current position.
    pub fn advance(&mut self) {
        debug_assert!(self.level_index < self.levels_read);
        self.level_index += 1;
    }

    /// Takes the next value of the current batch.
    pub fn read_value(&mut self, levels: Levels) -> Result<P> {
        if self.value_index >= self.values_read {
            return Err(Error::stream_corruption(
                self.column.as_str(),
                levels.definition,
                levels.repetition,
                "present level without a matching value",
            ));
        }
        let value = mem::take(&mut self.values[self.value_index]);
        self.value_index += 1;
        Ok(value)
    }

    /// Checks if the column has no positions left.
    pub fn is_exhausted(&mut self) -> Result<bool> {
        Ok(self.peek()?.is_none())
    }

    /// Moves up to `max_values` values of the current batch (or of a fresh
    /// batch) into `dest`, for columns which store no levels.
    pub fn read_direct(&mut self, max_values: usize, dest: &mut Vec<P>) -> Result<usize> {
        debug_assert!(self.def_levels.is_none() && self.rep_levels.is_none());
        if self.level_index == self.levels_read && !self.refill()? {
            return Ok(0);
        }

        let n = max_values.min(self.levels_read - self.level_index);
        let start = self.value_index;
        if start + n > self.values_read {
            return Err(Error::stream_corruption(
                self.column.as_str(),
                self.levels.max_definition_level(),
                0,
                "present level without a matching value",
            ));
        }
        dest.extend(self.values[start..start + n].iter_mut().map(mem::take));
        self.level_index += n;
        self.value_index += n;
        Ok(n)
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Reads the next batch. Returns false at the end of the column.
    fn refill(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        if self.value_index < self.values_read {
            return Err(Error::stream_corruption(
                self.column.as_str(),
                self.levels.max_definition_level(),
                0,
                format!(
                    "{} values left over without a matching level",
                    self.values_read - self.value_index
                ),
            ));
        }

        let (values_read, levels_read) = self.reader.read_batch(
            self.batch_size,
            self.def_levels.as_deref_mut(),
            self.rep_levels.as_deref_mut(),
            &mut self.values,
        )?;

        if levels_read > self.batch_size || values_read > levels_read {
            return Err(Error::stream_corruption(
                self.column.as_str(),
                self.levels.max_definition_level(),
                0,
                format!(
                    "reader returned {values_read} values and {levels_read} levels \
                     for a batch of {}",
                    self.batch_size
                ),
            ));
        }

        trace!(
            "Read {} levels, {} values for column {}",
            levels_read,
            values_read,
            self.column
        );

        self.levels_read = levels_read;
        self.values_read = values_read;
        self.level_index = 0;
        self.value_index = 0;
        if levels_read == 0 {
            self.exhausted = true;
            return Ok(false);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Repetition;
    use crate::memory::MemoryColumn;
    use crate::schema::SchemaFrame;
    use crate::schema_path::ColumnPath;

    fn optional_list_levels() -> LevelPath {
        LevelPath::new(
            &ColumnPath::from("a.list.element"),
            &[
                SchemaFrame::list(Repetition::Optional),
                SchemaFrame::repeated_group(),
                SchemaFrame::primitive(Repetition::Optional),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_peek_refills_across_batches() {
        let column =
            MemoryColumn::from_parts(3, 1, vec![3, 0, 3, 2], vec![0, 0, 0, 1], vec![10, 20]);
        let mut cursor = Cursor::new(column, "a", &optional_list_levels(), 3).unwrap();

        let mut seen = vec![];
        while let Some(levels) = cursor.peek().unwrap() {
            let value = if levels.definition == 3 {
                Some(cursor.read_value(levels).unwrap())
            } else {
                None
            };
            seen.push((levels.definition, levels.repetition, value));
            cursor.advance();
        }

        assert_eq!(
            seen,
            vec![(3, 0, Some(10)), (0, 0, None), (3, 0, Some(20)), (2, 1, None)]
        );
        assert!(cursor.is_exhausted().unwrap());
    }

    #[test]
    fn test_missing_value_is_corruption() {
        let column = MemoryColumn::from_parts(3, 1, vec![3], vec![0], vec![]);
        let mut cursor = Cursor::<i32, _>::new(column, "a", &optional_list_levels(), 8).unwrap();

        let levels = cursor.peek().unwrap().unwrap();
        assert!(matches!(
            cursor.read_value(levels),
            Err(Error::StreamCorruption { .. })
        ));
    }

    #[test]
    fn test_out_of_bounds_levels() {
        let column = MemoryColumn::from_parts(3, 1, vec![4], vec![0], vec![]);
        let mut cursor = Cursor::<i32, _>::new(column, "a", &optional_list_levels(), 8).unwrap();
        assert!(matches!(cursor.peek(), Err(Error::StreamCorruption { .. })));

        let column = MemoryColumn::from_parts(3, 1, vec![1], vec![2], vec![]);
        let mut cursor = Cursor::<i32, _>::new(column, "a", &optional_list_levels(), 8).unwrap();
        assert!(matches!(cursor.peek(), Err(Error::StreamCorruption { .. })));
    }

    #[test]
    fn test_read_direct() {
        let levels = LevelPath::new(
            &ColumnPath::from("x"),
            &[SchemaFrame::primitive(Repetition::Required)],
        )
        .unwrap();
        let column = MemoryColumn::from_parts(0, 0, vec![], vec![], vec![1i64, 2, 3, 4, 5]);
        let mut cursor = Cursor::new(column, "x", &levels, 2).unwrap();

        let mut dest = vec![];
        while cursor.read_direct(10, &mut dest).unwrap() > 0 {}
        assert_eq!(dest, vec![1, 2, 3, 4, 5]);
    }
}
