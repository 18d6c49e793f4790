//! Level types shared by the write and read paths.

/// Count of optional or repeated ancestors which are present for a value.
pub type DefinitionLevel = i16;

/// Depth of the most deeply nested repeated ancestor where a new element
/// begins. A level of 0 starts a new top-level entry.
pub type RepetitionLevel = i16;

/// The definition and repetition level of a single position in a column.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Levels {
    pub definition: DefinitionLevel,
    pub repetition: RepetitionLevel,
}

impl Levels {
    pub fn new(definition: DefinitionLevel, repetition: RepetitionLevel) -> Self {
        Self {
            definition,
            repetition,
        }
    }
}
