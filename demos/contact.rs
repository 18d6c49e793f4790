use repdef::memory::MemoryRowGroup;
use repdef::physical::PhysicalValue;
use repdef::schema::{optional_string, repeated_group, string};
use repdef::{RecordReader, RecordWriter, SchemaBuilder, ShapeCache, StreamOptions, Value, ValueBuilder};

fn main() -> repdef::Result<()> {
    env_logger::init();

    let schema = SchemaBuilder::new("Contact", vec![])
        .field(optional_string("name"))
        .field(repeated_group(
            "phones",
            vec![string("number"), optional_string("phone_type")],
        ))
        .build();

    let values: Vec<Value> = vec![
        // Alice: has a name and two phones
        ValueBuilder::default()
            .field("name", "Alice")
            .repeated(
                "phones",
                vec![
                    ValueBuilder::default()
                        .field("number", "555-1234")
                        .field("phone_type", "Home")
                        .build(),
                    ValueBuilder::default()
                        .field("number", "555-5678")
                        .field("phone_type", "Work")
                        .build(),
                ],
            )
            .build(),
        // Bob: has only a name
        ValueBuilder::default().field("name", "Bob").build(),
        // Charlie: has a name and an empty list of phones
        ValueBuilder::default()
            .field("name", "Charlie")
            .repeated("phones", Vec::<Value>::new())
            .build(),
        // Diana: has a name and one phone
        ValueBuilder::default()
            .field("name", "Diana")
            .repeated(
                "phones",
                vec![ValueBuilder::default()
                    .field("number", "555-9999")
                    .field("phone_type", "Work")
                    .build()],
            )
            .build(),
        // Eve: has a phone of unknown type but no name
        ValueBuilder::default()
            .repeated(
                "phones",
                vec![ValueBuilder::default().field("number", "555-0000").build()],
            )
            .build(),
    ];

    let mut row_group = MemoryRowGroup::<PhysicalValue>::from_schema(&schema)?;
    let mut cache = ShapeCache::new();
    let options = StreamOptions::default().with_buffer_length(4);

    let mut writer = RecordWriter::new(schema.clone(), row_group.columns_mut(), &mut cache, &options)?;
    writer.write_batch(&values)?;
    writer.close()?;

    for (i, descriptor) in row_group.descriptors().iter().enumerate() {
        if let Some(column) = row_group.column(i) {
            println!(
                "{descriptor}\n\tdef: {:?}\n\trep: {:?}\n\tvalues: {}",
                column.definition_levels(),
                column.repetition_levels(),
                column.values().len()
            );
        }
    }

    let mut reader = RecordReader::new(schema, row_group.columns_mut(), &mut cache, &options)?;
    while reader.has_next()? {
        for record in reader.read_batch(2)? {
            println!("{record}");
        }
    }
    Ok(())
}
