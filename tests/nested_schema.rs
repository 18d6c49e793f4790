use bytes::Bytes;
use repdef::memory::{MemoryColumn, MemoryRowGroup};
use repdef::physical::PhysicalValue;
use repdef::schema::{
    integer, optional_group, optional_string, repeated_group, repeated_integer, string,
};
use repdef::{RecordReader, RecordWriter, Schema, SchemaBuilder, ShapeCache, StreamOptions, Value, ValueBuilder};

/// Integration tests for shredding and assembling nested documents
///
/// These tests verify that records of the schema found in the paper "Dremel: Interactive
/// Analysis of Web-Scale Datasets" shred into exactly the column stripes listed in the paper,
/// and assemble back into the same records.

/// Create schema from the example listed in the Dremel paper
///
/// ```text
/// message Document {
///   required int64 DocId;
///   optional group Links {
///     repeated int64 Backward;
///     repeated int64 Forward;
///   }
///   repeated group Name {
///     repeated group Language {
///       required string Code;
///       optional string Country;
///     }
///     optional string Url;
///   }
/// }
/// ```
fn create_doc() -> Schema {
    SchemaBuilder::new("Document", vec![])
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
        .build()
}

fn language(code: &str, country: Option<&str>) -> Value {
    let builder = ValueBuilder::default().field("Code", code);
    match country {
        Some(country) => builder.field("Country", country),
        None => builder,
    }
    .build()
}

/// Record `r1` as listed in the paper. Absent fields are left out.
fn r1() -> Value {
    ValueBuilder::default()
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
                ValueBuilder::default()
                    .repeated(
                        "Language",
                        vec![language("en-us", Some("us")), language("en", None)],
                    )
                    .field("Url", "http://A")
                    .build(),
                ValueBuilder::default().field("Url", "http://B").build(),
                ValueBuilder::default()
                    .repeated("Language", vec![language("en-gb", Some("gb"))])
                    .build(),
            ],
        )
        .build()
}

/// Record `r2` as listed in the paper.
fn r2() -> Value {
    ValueBuilder::default()
        .field("DocId", 20i64)
        .field(
            "Links",
            ValueBuilder::default()
                .repeated("Backward", vec![10i64, 30])
                .repeated("Forward", vec![80i64])
                .build(),
        )
        .repeated(
            "Name",
            vec![ValueBuilder::default().field("Url", "http://C").build()],
        )
        .build()
}

fn shred_documents(records: &[Value]) -> MemoryRowGroup<PhysicalValue> {
    let schema = create_doc();
    let mut row_group = MemoryRowGroup::from_schema(&schema).unwrap();
    let mut writer = RecordWriter::new(
        schema,
        row_group.columns_mut(),
        &mut ShapeCache::new(),
        &StreamOptions::default(),
    )
    .unwrap();

    assert_eq!(writer.write_batch(records).unwrap(), records.len());
    writer.close().unwrap();
    row_group
}

fn column(row_group: &MemoryRowGroup<PhysicalValue>, i: usize) -> &MemoryColumn<PhysicalValue> {
    row_group.column(i).unwrap()
}

fn int(v: i64) -> Option<PhysicalValue> {
    Some(PhysicalValue::Int64(v))
}

fn text(v: &'static str) -> Option<PhysicalValue> {
    Some(PhysicalValue::ByteArray(Bytes::from_static(v.as_bytes())))
}

#[test]
fn test_column_paths_and_levels() {
    let columns = create_doc().columns().unwrap();

    let actual = columns
        .iter()
        .map(|c| {
            (
                c.path().to_dotted(),
                c.max_definition_level(),
                c.max_repetition_level(),
            )
        })
        .collect::<Vec<_>>();
    let expected = vec![
        ("DocId".to_string(), 0, 0),
        ("Links.Backward.list.element".to_string(), 2, 1),
        ("Links.Forward.list.element".to_string(), 2, 1),
        ("Name.list.element.Language.list.element.Code".to_string(), 2, 2),
        ("Name.list.element.Language.list.element.Country".to_string(), 3, 2),
        ("Name.list.element.Url".to_string(), 2, 1),
    ];

    assert_eq!(
        actual, expected,
        "Column paths and max levels should match the paper"
    );
}

#[test]
fn test_doc_id_stripe() {
    let row_group = shred_documents(&[r1(), r2()]);
    let doc_id = column(&row_group, 0);

    assert!(
        doc_id.definition_levels().is_empty() && doc_id.repetition_levels().is_empty(),
        "A required top-level column stores no levels"
    );
    assert_eq!(doc_id.triples(), vec![(0, 0, int(10)), (0, 0, int(20))]);
}

#[test]
fn test_links_stripes() {
    let row_group = shred_documents(&[r1(), r2()]);

    assert_eq!(
        column(&row_group, 1).triples(),
        vec![(1, 0, None), (2, 0, int(10)), (2, 1, int(30))],
        "Links.Backward is missing in r1, so it is written as an empty list"
    );
    assert_eq!(
        column(&row_group, 2).triples(),
        vec![
            (2, 0, int(20)),
            (2, 1, int(40)),
            (2, 1, int(60)),
            (2, 0, int(80)),
        ],
        "Links.Forward should match the paper"
    );
}

#[test]
fn test_name_stripes() {
    let row_group = shred_documents(&[r1(), r2()]);

    assert_eq!(
        column(&row_group, 3).triples(),
        vec![
            (2, 0, text("en-us")),
            (2, 2, text("en")),
            (1, 1, None),
            (2, 1, text("en-gb")),
            (1, 0, None),
        ],
        "Name.Language.Code should match the paper"
    );
    assert_eq!(
        column(&row_group, 4).triples(),
        vec![
            (3, 0, text("us")),
            (2, 2, None),
            (1, 1, None),
            (3, 1, text("gb")),
            (1, 0, None),
        ],
        "Name.Language.Country should match the paper"
    );
    assert_eq!(
        column(&row_group, 5).triples(),
        vec![
            (2, 0, text("http://A")),
            (2, 1, text("http://B")),
            (1, 1, None),
            (2, 0, text("http://C")),
        ],
        "Name.Url should match the paper"
    );
}

#[test]
fn test_row_boundaries() {
    let row_group = shred_documents(&[r1(), r2()]);

    for i in 1..row_group.num_columns() {
        let starts = column(&row_group, i)
            .repetition_levels()
            .iter()
            .filter(|&&r| r == 0)
            .count();
        assert_eq!(
            starts, 2,
            "Every repeated column should start exactly one entry per record"
        );
    }
}

#[test]
fn test_assemble_documents() {
    let mut row_group = shred_documents(&[r1(), r2()]);
    let mut reader = RecordReader::new(
        create_doc(),
        row_group.columns_mut(),
        &mut ShapeCache::new(),
        &StreamOptions::default(),
    )
    .unwrap();

    let records = reader.read_batch(10).unwrap();
    assert_eq!(records.len(), 2, "Both records should be assembled");
    assert!(!reader.has_next().unwrap(), "Columns should be exhausted");

    // Absent fields come back explicit: empty lists and nulls.
    let explicit_r1 = ValueBuilder::default()
        .field("DocId", 10i64)
        .field(
            "Links",
            ValueBuilder::default()
                .repeated("Backward", Vec::<i64>::new())
                .repeated("Forward", vec![20i64, 40, 60])
                .build(),
        )
        .repeated(
            "Name",
            vec![
                ValueBuilder::default()
                    .repeated(
                        "Language",
                        vec![
                            ValueBuilder::default()
                                .field("Code", "en-us")
                                .field("Country", "us")
                                .build(),
                            ValueBuilder::default()
                                .field("Code", "en")
                                .null("Country")
                                .build(),
                        ],
                    )
                    .field("Url", "http://A")
                    .build(),
                ValueBuilder::default()
                    .repeated("Language", Vec::<Value>::new())
                    .field("Url", "http://B")
                    .build(),
                ValueBuilder::default()
                    .repeated(
                        "Language",
                        vec![ValueBuilder::default()
                            .field("Code", "en-gb")
                            .field("Country", "gb")
                            .build()],
                    )
                    .null("Url")
                    .build(),
            ],
        )
        .build();
    let explicit_r2 = ValueBuilder::default()
        .field("DocId", 20i64)
        .field(
            "Links",
            ValueBuilder::default()
                .repeated("Backward", vec![10i64, 30])
                .repeated("Forward", vec![80i64])
                .build(),
        )
        .repeated(
            "Name",
            vec![ValueBuilder::default()
                .repeated("Language", Vec::<Value>::new())
                .field("Url", "http://C")
                .build()],
        )
        .build();

    assert_eq!(records[0], explicit_r1, "r1 should round trip");
    assert_eq!(records[1], explicit_r2, "r2 should round trip");
}

#[test]
fn test_missing_links_is_null() {
    let record = ValueBuilder::default()
        .field("DocId", 30i64)
        .repeated("Name", Vec::<Value>::new())
        .build();
    let row_group = shred_documents(&[record]);

    assert_eq!(
        column(&row_group, 1).triples(),
        vec![(0, 0, None)],
        "Missing optional Links is null at level 0"
    );
    assert_eq!(
        column(&row_group, 5).triples(),
        vec![(0, 0, None)],
        "Empty Name list is written at level 0"
    );
}
