//! The per-column shape tree driving shredding and assembly.
//!
//! A [`ShapeNode`] tree is built once per column by matching the logical
//! nesting of its values against the column's schema frames. Each node
//! carries the levels it writes and reads, so neither direction inspects
//! value types or frames again.

use crate::error::{Error, Result};
use crate::field::Repetition;
use crate::levels::LevelPath;
use crate::schema::{ColumnDescriptor, FrameKind, SchemaFrame};
use crate::schema_path::ColumnPath;
use log::debug;
use std::collections::HashMap;
use std::fmt::{self, Formatter};
use std::sync::Arc;

/// The logical nesting of the values of one column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogicalShape {
    Scalar,
    /// A struct holding the member on the path to the leaf.
    Struct(Box<LogicalShape>),
    /// A list (or map) of elements.
    List(Box<LogicalShape>),
}

impl LogicalShape {
    pub fn nested(inner: LogicalShape) -> Self {
        LogicalShape::Struct(Box::new(inner))
    }

    pub fn list(inner: LogicalShape) -> Self {
        LogicalShape::List(Box::new(inner))
    }

    /// Derives the canonical shape of a column from its frames.
    ///
    /// Every list or map group together with its repeated group becomes a
    /// list. Every other group becomes a struct.
    pub fn infer(frames: &[SchemaFrame]) -> LogicalShape {
        match frames.split_first() {
            None => LogicalShape::Scalar,
            Some((frame, rest)) => match frame.kind() {
                FrameKind::Primitive => LogicalShape::Scalar,
                FrameKind::List | FrameKind::Map => {
                    let element = rest.get(1..).unwrap_or_default();
                    LogicalShape::list(Self::infer(element))
                }
                FrameKind::Group => LogicalShape::nested(Self::infer(rest)),
            },
        }
    }
}

impl fmt::Display for LogicalShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LogicalShape::Scalar => write!(f, "scalar"),
            LogicalShape::Struct(inner) => write!(f, "struct<{inner}>"),
            LogicalShape::List(inner) => write!(f, "list<{inner}>"),
        }
    }
}

/// A node of the shape tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeNode {
    Leaf(LeafNode),
    /// A required struct adds no levels.
    RequiredStruct(Box<ShapeNode>),
    OptionalStruct(OptionalStructNode),
    List(ListNode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafNode {
    /// Definition level of a null leaf, `None` if the leaf is required.
    pub null_level: Option<i16>,
    /// Definition level of a present leaf.
    pub value_level: i16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalStructNode {
    /// Definition level of a null struct.
    pub null_level: i16,
    pub child: Box<ShapeNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListNode {
    /// Definition level of a null list, `None` if the list group is required.
    pub null_level: Option<i16>,
    /// Definition level of an empty list.
    pub empty_level: i16,
    /// Repetition level of every element after the first.
    pub repetition_level: i16,
    pub child: Box<ShapeNode>,
}

impl ShapeNode {
    /// Returns the lowest definition level at which this node is present.
    ///
    /// Levels below this one belong to an ancestor.
    pub fn min_definition_level(&self) -> i16 {
        match self {
            ShapeNode::Leaf(leaf) => leaf.null_level.unwrap_or(leaf.value_level),
            ShapeNode::RequiredStruct(child) => child.min_definition_level(),
            ShapeNode::OptionalStruct(node) => node.null_level,
            ShapeNode::List(list) => list.null_level.unwrap_or(list.empty_level),
        }
    }

    fn leaf(&self) -> &LeafNode {
        match self {
            ShapeNode::Leaf(leaf) => leaf,
            ShapeNode::RequiredStruct(child) => child.leaf(),
            ShapeNode::OptionalStruct(node) => node.child.leaf(),
            ShapeNode::List(list) => list.child.leaf(),
        }
    }
}

struct ShapeBuilder<'a> {
    column: &'a ColumnPath,
    frames: &'a [SchemaFrame],
    levels: &'a LevelPath,
}

impl ShapeBuilder<'_> {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::unsupported_shape(self.column.to_string(), message)
    }

    fn frame(&self, depth: usize, expected: &LogicalShape) -> Result<SchemaFrame> {
        self.frames.get(depth).copied().ok_or_else(|| {
            self.error(format!(
                "{expected} value is nested deeper than the {} schema frames",
                self.frames.len()
            ))
        })
    }

    /// Builds the node for the frame at `depth`, reached at `definition` and
    /// `repetition` levels.
    fn build(
        &self,
        shape: &LogicalShape,
        depth: usize,
        definition: i16,
        repetition: i16,
    ) -> Result<ShapeNode> {
        let frame = self.frame(depth, shape)?;
        let delta = self.levels.frame(depth);

        match shape {
            LogicalShape::Scalar => {
                let remaining = self.frames.len() - depth;
                if frame.kind() != FrameKind::Primitive || remaining != 1 {
                    return Err(self.error(format!(
                        "scalar value found at {frame}, {remaining} frames above the leaf"
                    )));
                }
                Ok(ShapeNode::Leaf(match frame.repetition() {
                    Repetition::Required => LeafNode {
                        null_level: None,
                        value_level: definition,
                    },
                    Repetition::Optional => LeafNode {
                        null_level: Some(definition),
                        value_level: definition + delta.definition,
                    },
                    Repetition::Repeated => {
                        return Err(self.error("repeated leaf outside of a list encoding"))
                    }
                }))
            }
            LogicalShape::Struct(inner) => {
                if !frame.is_group_boundary() {
                    return Err(self.error(format!("struct value found at {frame}")));
                }
                let child = self.build(inner, depth + 1, definition + delta.definition, repetition)?;
                Ok(match frame.repetition() {
                    Repetition::Optional => ShapeNode::OptionalStruct(OptionalStructNode {
                        null_level: definition,
                        child: Box::new(child),
                    }),
                    _ => ShapeNode::RequiredStruct(Box::new(child)),
                })
            }
            LogicalShape::List(inner) => {
                let remaining = self.frames.len() - depth;
                if remaining < 3 {
                    return Err(self.error(format!(
                        "list encoding needs a list group, a repeated group and an element, \
                         found {remaining} frames"
                    )));
                }
                if !frame.is_list_like() || frame.repetition() == Repetition::Repeated {
                    return Err(self.error(format!("list value found at {frame}")));
                }
                let repeated = self.frame(depth + 1, shape)?;
                if repeated != SchemaFrame::repeated_group() {
                    return Err(self.error(format!(
                        "expected a repeated group below {frame}, found {repeated}"
                    )));
                }

                let empty_level = definition + delta.definition;
                let repeated_delta = self.levels.frame(depth + 1);
                let element_level = empty_level + repeated_delta.definition;
                let repetition_level = repetition + repeated_delta.repetition;
                let child = self.build(inner, depth + 2, element_level, repetition_level)?;

                Ok(ShapeNode::List(ListNode {
                    null_level: (frame.repetition() == Repetition::Optional).then_some(definition),
                    empty_level,
                    repetition_level,
                    child: Box::new(child),
                }))
            }
        }
    }
}

/// The shape tree of one column together with its descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnShape {
    descriptor: ColumnDescriptor,
    shape: LogicalShape,
    root: ShapeNode,
}

impl ColumnShape {
    /// Matches `shape` against the frames of `descriptor`.
    ///
    /// Fails with [`Error::UnsupportedShape`] if the nesting of the shape
    /// does not follow the frames one to one.
    pub fn new(descriptor: ColumnDescriptor, shape: LogicalShape) -> Result<Self> {
        let builder = ShapeBuilder {
            column: descriptor.path(),
            frames: descriptor.frames(),
            levels: descriptor.levels(),
        };
        let root = builder.build(&shape, 0, 0, 0)?;

        let leaf = root.leaf();
        if leaf.value_level != descriptor.max_definition_level() {
            return Err(builder.error(format!(
                "leaf is defined at level {}, expected {}",
                leaf.value_level,
                descriptor.max_definition_level()
            )));
        }

        debug!(
            "Built shape {} for column {} (max def: {}, max rep: {})",
            shape,
            descriptor.path(),
            descriptor.max_definition_level(),
            descriptor.max_repetition_level()
        );

        Ok(Self {
            descriptor,
            shape,
            root,
        })
    }

    /// Builds the shape tree from the canonical shape of the column.
    pub fn infer(descriptor: ColumnDescriptor) -> Result<Self> {
        let shape = LogicalShape::infer(descriptor.frames());
        Self::new(descriptor, shape)
    }

    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.descriptor
    }

    pub fn shape(&self) -> &LogicalShape {
        &self.shape
    }

    pub fn root(&self) -> &ShapeNode {
        &self.root
    }

    pub(crate) fn column_name(&self) -> String {
        self.descriptor.path().to_string()
    }

    /// Checks if the column is a single leaf frame directly below the root.
    pub fn is_root_leaf(&self) -> bool {
        matches!(self.root, ShapeNode::Leaf(_))
    }
}

/// Caches shape trees by column path so each is built once per cache.
#[derive(Debug, Default)]
pub struct ShapeCache {
    shapes: HashMap<ColumnPath, Arc<ColumnShape>>,
}

impl ShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached shape of a column, building it on first use.
    pub fn get_or_build(&mut self, descriptor: &ColumnDescriptor) -> Result<Arc<ColumnShape>> {
        if let Some(shape) = self.shapes.get(descriptor.path()) {
            if shape.descriptor() == descriptor {
                return Ok(Arc::clone(shape));
            }
        }

        let shape = Arc::new(ColumnShape::infer(descriptor.clone())?);
        self.shapes
            .insert(descriptor.path().clone(), Arc::clone(&shape));
        Ok(shape)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
