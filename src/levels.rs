//! Maximum and per-frame definition and repetition levels of a leaf column.

use crate::common::{DefinitionLevel, Levels, RepetitionLevel};
use crate::error::{Error, Result};
use crate::schema::{FrameKind, SchemaFrame};
use crate::field::Repetition;
use crate::schema_path::ColumnPath;

/// The level increments contributed by a single schema frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameLevels {
    /// 1 if the frame is optional or repeated, else 0.
    pub definition: DefinitionLevel,
    /// 1 if the frame is repeated, else 0.
    pub repetition: RepetitionLevel,
}

impl FrameLevels {
    fn of(frame: &SchemaFrame) -> Self {
        match frame.repetition() {
            Repetition::Required => FrameLevels {
                definition: 0,
                repetition: 0,
            },
            Repetition::Optional => FrameLevels {
                definition: 1,
                repetition: 0,
            },
            Repetition::Repeated => FrameLevels {
                definition: 1,
                repetition: 1,
            },
        }
    }
}

/// Levels derived from the root-to-leaf frames of one leaf column.
///
/// ```text
/// optional group a {            def +1
///     repeated group list {     def +1, rep +1
///         optional int32 element;   def +1
///     }
/// }
/// max definition level: 3, max repetition level: 1
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelPath {
    max_definition_level: DefinitionLevel,
    max_repetition_level: RepetitionLevel,
    frame_levels: Vec<FrameLevels>,
}

impl LevelPath {
    /// Computes the levels of a column from its root-to-leaf frames.
    ///
    /// The frames must end in a single primitive frame, preceded only by
    /// group frames.
    pub fn new(column: &ColumnPath, frames: &[SchemaFrame]) -> Result<Self> {
        let Some((leaf, ancestors)) = frames.split_last() else {
            return Err(Error::unsupported_shape(
                column.to_string(),
                "a column needs at least one schema frame",
            ));
        };

        if leaf.kind() != FrameKind::Primitive {
            return Err(Error::unsupported_shape(
                column.to_string(),
                format!("last frame must be a primitive leaf, found {}", leaf),
            ));
        }

        if let Some(depth) = ancestors
            .iter()
            .position(|f| f.kind() == FrameKind::Primitive)
        {
            return Err(Error::unsupported_shape(
                column.to_string(),
                format!("primitive frame at depth {depth} is not the leaf"),
            ));
        }

        let frame_levels = frames.iter().map(FrameLevels::of).collect::<Vec<_>>();

        let mut max_definition_level: DefinitionLevel = 0;
        let mut max_repetition_level: RepetitionLevel = 0;
        for levels in &frame_levels {
            max_definition_level = max_definition_level
                .checked_add(levels.definition)
                .ok_or_else(|| {
                    Error::unsupported_shape(column.to_string(), "definition level overflow")
                })?;
            max_repetition_level += levels.repetition;
        }

        Ok(Self {
            max_definition_level,
            max_repetition_level,
            frame_levels,
        })
    }

    pub fn max_definition_level(&self) -> DefinitionLevel {
        self.max_definition_level
    }

    pub fn max_repetition_level(&self) -> RepetitionLevel {
        self.max_repetition_level
    }

    /// Returns the level increments of the frame at `depth`.
    pub fn frame(&self, depth: usize) -> FrameLevels {
        self.frame_levels.get(depth).copied().unwrap_or_default()
    }

    /// Checks if definition levels must be stored for this column.
    pub fn has_definition_levels(&self) -> bool {
        self.max_definition_level > 0
    }

    /// Checks if repetition levels must be stored for this column.
    pub fn has_repetition_levels(&self) -> bool {
        self.max_repetition_level > 0
    }

    /// Checks if both levels lie within the bounds of this column.
    pub fn contains(&self, levels: Levels) -> bool {
        (0..=self.max_definition_level).contains(&levels.definition)
            && (0..=self.max_repetition_level).contains(&levels.repetition)
    }
}
