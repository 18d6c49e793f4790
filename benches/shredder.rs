use criterion::{black_box, criterion_group, criterion_main, Criterion};
use repdef::field::Repetition;
use repdef::memory::{MemoryColumn, MemoryRowGroup};
use repdef::physical::{PhysicalType, PhysicalValue};
use repdef::schema::{bool, integer, optional_string, repeated_group, string};
use repdef::schema_path::ColumnPath;
use repdef::{
    ColumnAssembler, ColumnDescriptor, ColumnShredder, LogicalValue, RecordWriter, Schema,
    SchemaBuilder, SchemaFrame, ShapeCache, StreamOptions, Value, ValueBuilder,
};

fn setup_flat_schema() -> (Schema, Vec<Value>) {
    let schema = SchemaBuilder::new("flat", vec![])
        .field(string("name"))
        .field(integer("id"))
        .field(bool("active"))
        .build();

    let values = (0..1024i64)
        .map(|id| {
            ValueBuilder::default()
                .field("name", "User")
                .field("id", id)
                .field("active", id % 3 == 0)
                .build()
        })
        .collect();

    (schema, values)
}

fn write_records(schema: &Schema, values: &[Value], cache: &mut ShapeCache) {
    let mut row_group = MemoryRowGroup::<PhysicalValue>::from_schema(schema).unwrap();
    let mut writer = RecordWriter::new(
        schema.clone(),
        row_group.columns_mut(),
        cache,
        &StreamOptions::default(),
    )
    .unwrap();
    writer.write_batch(values).unwrap();
    black_box(writer.close().unwrap());
}

fn benchmark_flat_schema(c: &mut Criterion) {
    let (schema, values) = setup_flat_schema();
    let mut cache = ShapeCache::new();

    c.bench_function("flat_schema_record_writer", |b| {
        b.iter(|| write_records(black_box(&schema), black_box(&values), &mut cache))
    });
}

fn setup_nested_schema() -> (Schema, Vec<Value>) {
    let schema = SchemaBuilder::new("Contact", vec![])
        .field(optional_string("name"))
        .field(repeated_group(
            "phones",
            vec![optional_string("number"), optional_string("phone_type")],
        ))
        .build();

    let contacts: Vec<Value> = vec![
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
        // _: has a phone but no name
        ValueBuilder::default()
            .repeated(
                "phones",
                vec![ValueBuilder::default()
                    .field("phone_type", "Mobile")
                    .build()],
            )
            .build(),
    ];
    let values = contacts.iter().cycle().take(1024).cloned().collect();

    (schema, values)
}

fn benchmark_nested_schema(c: &mut Criterion) {
    let (schema, values) = setup_nested_schema();
    let mut cache = ShapeCache::new();

    c.bench_function("nested_schema_record_writer", |b| {
        b.iter(|| write_records(black_box(&schema), black_box(&values), &mut cache))
    });
}

/// `optional list<optional list<optional int32>>`
fn setup_nested_lists() -> (ColumnDescriptor, Vec<LogicalValue<i32>>) {
    let descriptor = ColumnDescriptor::new(
        ColumnPath::from("matrix"),
        vec![
            SchemaFrame::list(Repetition::Optional),
            SchemaFrame::repeated_group(),
            SchemaFrame::list(Repetition::Optional),
            SchemaFrame::repeated_group(),
            SchemaFrame::primitive(Repetition::Optional),
        ],
        PhysicalType::Int32,
    )
    .unwrap();

    let values = (0..1024)
        .map(|i| match i % 4 {
            0 => LogicalValue::Null,
            1 => LogicalValue::list([]),
            _ => LogicalValue::list((0..i % 7).map(|j| {
                LogicalValue::list((0..j).map(|k| match k % 5 {
                    0 => LogicalValue::Null,
                    _ => LogicalValue::scalar(k),
                }))
            })),
        })
        .collect();

    (descriptor, values)
}

fn benchmark_column_round_trip(c: &mut Criterion) {
    let (descriptor, values) = setup_nested_lists();
    let options = StreamOptions::default();

    c.bench_function("nested_lists_shredder", |b| {
        b.iter(|| {
            let mut shredder = ColumnShredder::infer(
                &descriptor,
                MemoryColumn::for_descriptor(&descriptor),
                &options,
            )
            .unwrap();
            shredder.write_batch(black_box(&values)).unwrap();
            black_box(shredder.close().unwrap())
        })
    });

    let mut shredder = ColumnShredder::infer(
        &descriptor,
        MemoryColumn::for_descriptor(&descriptor),
        &options,
    )
    .unwrap();
    shredder.write_batch(&values).unwrap();
    let column = shredder.close().unwrap();

    c.bench_function("nested_lists_assembler", |b| {
        b.iter(|| {
            let mut assembler =
                ColumnAssembler::<i32, _>::infer(&descriptor, column.clone(), &options).unwrap();
            black_box(assembler.read_all(values.len()).unwrap())
        })
    });
}

criterion_group!(
    benchmark_shredder,
    benchmark_flat_schema,
    benchmark_nested_schema,
    benchmark_column_round_trip
);
criterion_main!(benchmark_shredder);
