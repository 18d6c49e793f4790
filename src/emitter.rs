//! Fixed-capacity buffer of levels and values in front of a physical writer.

use crate::common::{DefinitionLevel, Levels, RepetitionLevel};
use crate::convert::{ByteBuffer, LeafType};
use crate::error::{Error, Result};
use crate::levels::LevelPath;
use crate::physical::ColumnWriter;
use log::{debug, trace};

/// Writable slots handed out by [`BufferedEmitter::reserve`].
///
/// Level slices are `None` for levels the column does not store. All slices
/// start at the first uncommitted position.
#[derive(Debug)]
pub struct Slots<'a, P> {
    pub def_levels: Option<&'a mut [DefinitionLevel]>,
    pub rep_levels: Option<&'a mut [RepetitionLevel]>,
    pub values: &'a mut [P],
    pub bytes: &'a mut ByteBuffer,
}

/// Accumulates levels and values and writes them through to a
/// [`ColumnWriter`] whenever the buffer fills up.
#[derive(Debug)]
pub struct BufferedEmitter<P, W> {
    writer: W,
    column: String,
    capacity: usize,
    def_levels: Option<Vec<DefinitionLevel>>,
    rep_levels: Option<Vec<RepetitionLevel>>,
    values: Vec<P>,
    bytes: ByteBuffer,
    num_levels: usize,
    num_values: usize,
    flushes: usize,
}

impl<P, W> BufferedEmitter<P, W>
where
    P: Clone + Default,
    W: ColumnWriter<P>,
{
    pub fn new(
        writer: W,
        column: impl Into<String>,
        levels: &LevelPath,
        capacity: usize,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::invalid_arg(
                "capacity",
                "buffer capacity must be at least 1",
            ));
        }

        Ok(Self {
            writer,
            column: column.into(),
            capacity,
            def_levels: levels
                .has_definition_levels()
                .then(|| vec![0; capacity]),
            rep_levels: levels
                .has_repetition_levels()
                .then(|| vec![0; capacity]),
            values: vec![P::default(); capacity],
            bytes: ByteBuffer::default(),
            num_levels: 0,
            num_values: 0,
            flushes: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the count of buffered, not yet flushed positions.
    pub fn buffered(&self) -> usize {
        self.num_levels
    }

    /// Returns the count of flushes which reached the physical writer.
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Returns `n` writable slots, flushing first if fewer remain.
    pub fn reserve(&mut self, n: usize) -> Result<Slots<'_, P>> {
        if n > self.capacity {
            return Err(Error::invalid_arg(
                "n",
                format!(
                    "cannot reserve {n} slots in a buffer of capacity {}",
                    self.capacity
                ),
            ));
        }
        if self.num_levels + n > self.capacity {
            self.flush()?;
        }

        let (start, value_start) = (self.num_levels, self.num_values);
        Ok(Slots {
            def_levels: self
                .def_levels
                .as_deref_mut()
                .map(|levels| &mut levels[start..start + n]),
            rep_levels: self
                .rep_levels
                .as_deref_mut()
                .map(|levels| &mut levels[start..start + n]),
            values: &mut self.values[value_start..value_start + n],
            bytes: &mut self.bytes,
        })
    }

    /// Commits `n_levels` positions and `n_values` values written into the
    /// last reserved slots.
    pub fn advance(&mut self, n_levels: usize, n_values: usize) {
        debug_assert!(n_values <= n_levels);
        debug_assert!(self.num_levels + n_levels <= self.capacity);
        self.num_levels += n_levels;
        self.num_values += n_values;
    }

    /// Buffers a single position without a value.
    pub fn push_null(&mut self, levels: Levels) -> Result<()> {
        let slots = self.reserve(1)?;
        Self::write_levels(slots.def_levels, slots.rep_levels, levels);
        self.advance(1, 0);
        Ok(())
    }

    /// Buffers a single position carrying `value`.
    pub fn push_value<T>(&mut self, levels: Levels, value: &T) -> Result<()>
    where
        T: LeafType<Physical = P>,
    {
        let slots = self.reserve(1)?;
        slots.values[0] = value.to_physical(slots.bytes);
        Self::write_levels(slots.def_levels, slots.rep_levels, levels);
        self.advance(1, 1);
        Ok(())
    }

    fn write_levels(
        def_levels: Option<&mut [DefinitionLevel]>,
        rep_levels: Option<&mut [RepetitionLevel]>,
        levels: Levels,
    ) {
        if let Some(def) = def_levels {
            def[0] = levels.definition;
        }
        if let Some(rep) = rep_levels {
            rep[0] = levels.repetition;
        }
    }

    /// Writes all buffered positions through to the physical writer.
    pub fn flush(&mut self) -> Result<()> {
        if self.num_levels == 0 {
            return Ok(());
        }

        let (n_levels, n_values) = (self.num_levels, self.num_values);
        self.writer.write_batch(
            self.def_levels.as_deref().map(|levels| &levels[..n_levels]),
            self.rep_levels.as_deref().map(|levels| &levels[..n_levels]),
            &self.values[..n_values],
        )?;

        trace!(
            "Flushed {} levels, {} values ({} bytes) for column {}",
            n_levels,
            n_values,
            self.bytes.pending(),
            self.column
        );

        self.clear_buffered();
        self.flushes += 1;
        Ok(())
    }

    /// Drops every buffered position without writing it.
    pub fn discard(&mut self) {
        if self.num_levels > 0 {
            debug!(
                "Discarding {} buffered levels for column {}",
                self.num_levels, self.column
            );
        }
        self.clear_buffered();
    }

    fn clear_buffered(&mut self) {
        // Releases byte array handles held by the buffered values.
        self.values[..self.num_values].fill(P::default());
        self.bytes.reset();
        self.num_levels = 0;
        self.num_values = 0;
    }

    /// Flushes and returns the physical writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.writer)
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
    fn test_zero_capacity_is_rejected() {
        let result = BufferedEmitter::<i32, _>::new(
            MemoryColumn::<i32>::new(3, 1),
            "a",
            &optional_list_levels(),
            0,
        );
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_reserve_more_than_capacity() {
        let mut emitter =
            BufferedEmitter::new(MemoryColumn::<i32>::new(3, 1), "a", &optional_list_levels(), 2)
                .unwrap();
        assert!(matches!(
            emitter.reserve(3),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_flush_on_overflow() {
        let mut emitter =
            BufferedEmitter::new(MemoryColumn::<i32>::new(3, 1), "a", &optional_list_levels(), 2)
                .unwrap();

        emitter.push_value(Levels::new(3, 0), &1).unwrap();
        emitter.push_null(Levels::new(2, 1)).unwrap();
        assert_eq!(emitter.flushes(), 0);
        assert_eq!(emitter.buffered(), 2);

        emitter.push_value(Levels::new(3, 1), &2).unwrap();
        assert_eq!(emitter.flushes(), 1, "A full buffer is flushed on reserve");
        assert_eq!(emitter.buffered(), 1);

        let column = emitter.into_inner().unwrap();
        assert_eq!(column.definition_levels(), &[3, 2, 3]);
        assert_eq!(column.repetition_levels(), &[0, 1, 1]);
        assert_eq!(column.values(), &[1, 2]);
        assert_eq!(column.write_batches(), 2);
    }

    #[test]
    fn test_flush_empty_buffer_is_noop() {
        let mut emitter =
            BufferedEmitter::new(MemoryColumn::<i32>::new(3, 1), "a", &optional_list_levels(), 4)
                .unwrap();
        emitter.flush().unwrap();
        assert_eq!(emitter.flushes(), 0);
        assert_eq!(emitter.writer().write_batches(), 0);
    }

    #[test]
    fn test_bulk_reserve() {
        let levels = LevelPath::new(
            &ColumnPath::from("x"),
            &[SchemaFrame::primitive(Repetition::Required)],
        )
        .unwrap();
        let mut emitter =
            BufferedEmitter::new(MemoryColumn::<i64>::new(0, 0), "x", &levels, 8).unwrap();

        let slots = emitter.reserve(3).unwrap();
        assert!(slots.def_levels.is_none());
        assert!(slots.rep_levels.is_none());
        slots.values.copy_from_slice(&[7, 8, 9]);
        emitter.advance(3, 3);

        let column = emitter.into_inner().unwrap();
        assert_eq!(column.values(), &[7, 8, 9]);
        assert!(column.definition_levels().is_empty());
    }
}
