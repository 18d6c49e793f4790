use crate::error::Result;
use crate::field::{DataType, Field, LIST_REPEATED_NAME, MAP_REPEATED_NAME};
use crate::schema::{ColumnDescriptor, Schema, SchemaFrame};
use crate::schema_path::ColumnPath;
use std::vec::IntoIter;

#[derive(Debug)]
struct StructIterationState<'a> {
    field_iter: IntoIter<&'a Field>,
    column_path: ColumnPath,
    frames: Vec<SchemaFrame>,
}

impl<'a> StructIterationState<'a> {
    fn new(fields: Vec<&'a Field>, column_path: ColumnPath, frames: Vec<SchemaFrame>) -> Self {
        Self {
            field_iter: fields.into_iter(),
            column_path,
            frames,
        }
    }
}

/// Depth-first iterator over the leaf columns of a [`Schema`].
#[derive(Debug)]
pub struct SchemaLeafIterator<'a> {
    stack: Vec<StructIterationState<'a>>,
}

impl<'a> SchemaLeafIterator<'a> {
    pub(crate) fn new(schema: &'a Schema) -> Self {
        Self {
            stack: vec![StructIterationState::new(
                schema.fields().iter().collect(),
                ColumnPath::default(),
                vec![],
            )],
        }
    }
}

impl Iterator for SchemaLeafIterator<'_> {
    type Item = Result<ColumnDescriptor>;

    /**
    message Order {
        required OrderId integer,
        repeated Items group {
            required ItemId integer,
            optional Quantity integer,
        },
        optional Attributes map<string, string>,
    }

    Columns and frames:
    - OrderId                        [required primitive]
    - Items.list.element.ItemId      [required list group, repeated group,
                                      required group, required primitive]
    - Items.list.element.Quantity    [required list group, repeated group,
                                      required group, optional primitive]
    - Attributes.key_value.key       [optional map group, repeated group,
                                      required primitive]
    - Attributes.key_value.value     [optional map group, repeated group,
                                      optional primitive]

    Stack Traversal:
    1. Push TopLevel Iterator; path = []
    2. Push Items Iterator; path = ["Items", "list"]
    3. Push Items element Iterator; path = ["Items", "list", "element"]
    4. Pop Items element Iterator, Pop Items Iterator
    5. Push Attributes Iterator; path = ["Attributes", "key_value"]
    6. Pop Attributes Iterator
    7. Pop TopLevel Iterator
    **/
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(struct_iter) = self.stack.last_mut() {
            if let Some(field) = struct_iter.field_iter.next() {
                let path = struct_iter.column_path.append_name(field.name());
                let mut frames = struct_iter.frames.clone();
                let repetition = field.repetition();

                if let Some(physical_type) = field.data_type().physical_type() {
                    frames.push(SchemaFrame::primitive(repetition));
                    return Some(ColumnDescriptor::new(path, frames, physical_type));
                }

                match field.data_type() {
                    DataType::Struct(fields) => {
                        frames.push(SchemaFrame::group(repetition));
                        self.stack.push(StructIterationState::new(
                            fields.iter().collect(),
                            path,
                            frames,
                        ));
                    }
                    DataType::List(element) => {
                        frames.push(SchemaFrame::list(repetition));
                        frames.push(SchemaFrame::repeated_group());
                        self.stack.push(StructIterationState::new(
                            vec![element.as_ref()],
                            path.append_name(LIST_REPEATED_NAME),
                            frames,
                        ));
                    }
                    DataType::Map(key, value) => {
                        frames.push(SchemaFrame::map(repetition));
                        frames.push(SchemaFrame::repeated_group());
                        self.stack.push(StructIterationState::new(
                            vec![key.as_ref(), value.as_ref()],
                            path.append_name(MAP_REPEATED_NAME),
                            frames,
                        ));
                    }
                    _ => {}
                }
            } else {
                self.stack.pop();
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use crate::field::{DataType, Repetition};
    use crate::physical::PhysicalType;
    use crate::schema::test_utils::create_doc;
    use crate::schema::{
        bool, integer, optional_map, required_group, string, FrameKind, SchemaBuilder,
        SchemaFrame,
    };
    use crate::schema_path::ColumnPath;

    #[test]
    fn test_debug_shows_pending_fields() {
        let schema = SchemaBuilder::new("s", vec![]).field(integer("id")).build();
        let debug = format!("{:?}", schema.leaves());

        assert!(debug.starts_with("SchemaLeafIterator"), "{debug}");
        assert!(debug.contains("\"id\""), "Pending fields are listed: {debug}");
    }

    #[test]
    fn test_empty_schema() {
        let schema = SchemaBuilder::new("empty", vec![]).build();
        let columns = schema.columns().unwrap();
        assert_eq!(columns.len(), 0);
    }

    #[test]
    fn test_flat_struct() {
        let schema = SchemaBuilder::new("test", vec![])
            .field(integer("id"))
            .field(string("name"))
            .field(bool("active"))
            .build();

        let columns = schema.columns().unwrap();
        assert_eq!(columns.len(), 3);

        assert_eq!(columns[0].path(), &ColumnPath::from(&["id"][..]));
        assert_eq!(columns[1].path(), &ColumnPath::from(&["name"][..]));
        assert_eq!(columns[2].path(), &ColumnPath::from(&["active"][..]));

        assert_eq!(columns[0].physical_type(), PhysicalType::Int64);
        assert_eq!(columns[1].physical_type(), PhysicalType::ByteArray);
        assert_eq!(columns[2].physical_type(), PhysicalType::Boolean);

        for column in &columns {
            assert_eq!(
                column.frames(),
                &[SchemaFrame::primitive(Repetition::Required)],
                "Expected a single required frame for column {}",
                column.path()
            );
        }
    }

    #[test]
    fn test_nested_struct() {
        let schema = SchemaBuilder::new("test", vec![])
            .field(required_group(
                "user",
                vec![integer("id"), string("name"), bool("active")],
            ))
            .build();

        let columns = schema.columns().unwrap();
        assert_eq!(columns.len(), 3);

        assert_eq!(columns[0].path(), &ColumnPath::from(&["user", "id"][..]));
        assert_eq!(columns[1].path(), &ColumnPath::from(&["user", "name"][..]));
        assert_eq!(columns[2].path(), &ColumnPath::from(&["user", "active"][..]));

        assert!(columns[0].frames()[0].is_group_boundary());
    }

    #[test]
    fn test_map_columns() {
        let schema = SchemaBuilder::new("test", vec![])
            .field(optional_map("attrs", DataType::String, DataType::Int32, true))
            .build();

        let columns = schema.columns().unwrap();
        assert_eq!(columns.len(), 2);

        assert_eq!(columns[0].path(), &ColumnPath::from("attrs.key_value.key"));
        assert_eq!(columns[1].path(), &ColumnPath::from("attrs.key_value.value"));
        assert_eq!(columns[0].frames()[0].kind(), FrameKind::Map);
        assert_eq!(columns[0].max_definition_level(), 2);
        assert_eq!(columns[1].max_definition_level(), 3);
        assert_eq!(columns[1].max_repetition_level(), 1);
    }

    #[test]
    fn test_leaf_paths() {
        let doc = create_doc();
        let columns = doc.columns().unwrap();

        assert_eq!(columns.len(), 6);

        assert_eq!(columns[0].path(), &ColumnPath::from("DocId"));
        assert_eq!(
            columns[1].path(),
            &ColumnPath::from("Links.Backward.list.element")
        );
        assert_eq!(
            columns[2].path(),
            &ColumnPath::from("Links.Forward.list.element")
        );
        assert_eq!(
            columns[3].path(),
            &ColumnPath::from("Name.list.element.Language.list.element.Code")
        );
        assert_eq!(
            columns[4].path(),
            &ColumnPath::from("Name.list.element.Language.list.element.Country")
        );
        assert_eq!(
            columns[5].path(),
            &ColumnPath::from("Name.list.element.Url")
        );

        let levels = columns
            .iter()
            .map(|c| (c.max_definition_level(), c.max_repetition_level()))
            .collect::<Vec<_>>();
        assert_eq!(
            levels,
            vec![(0, 0), (2, 1), (2, 1), (2, 2), (3, 2), (2, 1)],
            "Max levels should match the Dremel paper"
        );
    }
}
