use repdef::memory::MemoryRowGroup;
use repdef::physical::PhysicalValue;
use repdef::schema::{integer, optional_group, optional_string, repeated_group, repeated_integer, string};
use repdef::{RecordReader, RecordWriter, SchemaBuilder, ShapeCache, StreamOptions, ValueBuilder};

/// # Schema
/// message Document {
///     required int64 DocId;
///     optional group Links {
///         repeated int64 Backward;
///         repeated int64 Forward;
///     }
///     repeated group Name {
///         repeated group Language {
///             required string Code;
///             optional string Country;
///         }
///         optional string Url;
///     }
/// }
fn main() -> repdef::Result<()> {
    env_logger::init();

    let schema = SchemaBuilder::new("Document", vec![])
        .field(integer("DocId"))
        .field(optional_group(
            "Links",
            vec![repeated_integer("Backward"), repeated_integer("Forward")],
        ))
        .field(repeated_group(
            "Name",
            vec![
                repeated_group("Language", vec![string("Code"), optional_string("Country")]),
                optional_string("Url"),
            ],
        ))
        .build();

    let value = ValueBuilder::default()
        .field("DocId", 10i64)
        .field(
            "Links",
            ValueBuilder::default()
                .repeated("Forward", vec![20i64, 40, 60])
                .build(),
        )
        .repeated(
            "Name",
            vec![
                ValueBuilder::default() // 0
                    .repeated(
                        "Language",
                        vec![
                            ValueBuilder::default()
                                .field("Code", "en-us")
                                .field("Country", "us")
                                .build(),
                            ValueBuilder::default().field("Code", "en").build(),
                        ],
                    )
                    .field("Url", "http://A")
                    .build(),
                ValueBuilder::default().field("Url", "http://B").build(), // 1
                ValueBuilder::default() // 2
                    .repeated(
                        "Language",
                        vec![ValueBuilder::default()
                            .field("Code", "en-gb")
                            .field("Country", "gb")
                            .build()],
                    )
                    .build(),
            ],
        )
        .build();

    let mut row_group = MemoryRowGroup::<PhysicalValue>::from_schema(&schema)?;
    let mut cache = ShapeCache::new();
    let options = StreamOptions::default();

    let mut writer = RecordWriter::new(schema.clone(), row_group.columns_mut(), &mut cache, &options)?;
    writer.write_batch(std::slice::from_ref(&value))?;
    writer.close()?;

    for (i, descriptor) in row_group.descriptors().iter().enumerate() {
        println!("{descriptor}");
        if let Some(column) = row_group.column(i) {
            for (def, rep, value) in column.triples() {
                println!("\tr: {rep}, d: {def}, value: {value:?}");
            }
        }
    }

    let mut reader = RecordReader::new(schema, row_group.columns_mut(), &mut cache, &options)?;
    for record in reader.read_batch(1)? {
        println!("{record}");
    }
    Ok(())
}
