use sheet_ingest::ingestion::csv::CsvParser;
use sheet_ingest::ingestion::{ingest_from_bytes, ingest_from_path, IngestionOptions, SourceParser};
use sheet_ingest::types::{ColumnMapping, ColumnSpec, RequiredColumns};
use sheet_ingest::IngestionError;

fn people_spec() -> ColumnSpec {
    ColumnSpec::from_json_path("tests/fixtures/people_spec.json").unwrap()
}

fn spec(required: &[&str], mapping: &[(&str, &str)]) -> ColumnSpec {
    let required: RequiredColumns = required.iter().copied().collect();
    let mapping: ColumnMapping = mapping.iter().copied().collect();
    ColumnSpec::new(required, mapping)
}

#[test]
fn ingest_csv_from_path_happy_path() {
    let file = ingest_from_path("tests/fixtures/people.csv", &people_spec(), &IngestionOptions::default()).unwrap();

    assert_eq!(file.file_name, "people.csv");
    assert_eq!(file.sheets.len(), 1);
    let sheet = &file.sheets[0];
    assert_eq!(sheet.name, "csv");
    // 备注 is empty in every row, so "remark" is pruned.
    assert_eq!(sheet.header, vec!["name", "age", "updated_at"]);
    assert_eq!(sheet.rows[0], vec!["Alice", "30", "2024-01-02 03:04:05"]);
    assert_eq!(sheet.rows[1], vec!["Bob", "", "2024-01-02 03:04:05"]);
    assert_eq!(file.total_row_count, 2);
}

#[test]
fn ingest_gbk_csv_is_detected_and_decoded() {
    let (bytes, _, had_errors) = encoding_rs::GBK.encode("姓名,更新时间\n张三,2024-01-02\n李四,\n");
    assert!(!had_errors);

    let spec = spec(&["姓名"], &[("姓名", "name"), ("更新时间", "updated_at")]);
    let file = ingest_from_bytes("gbk.csv", &bytes, &spec, &IngestionOptions::default()).unwrap();

    let sheet = &file.sheets[0];
    assert_eq!(sheet.header, vec!["name", "updated_at"]);
    assert_eq!(sheet.rows[0], vec!["张三", "2024-01-02 00:00:00"]);
    assert_eq!(sheet.rows[1], vec!["李四", ""]);
}

#[test]
fn ingest_latin1_csv_falls_back_to_iso_8859_1() {
    let bytes = b"name,city\nJos\xe9,Z\xfcrich\n";
    let spec = spec(&["name"], &[("name", "name"), ("city", "city")]);
    let file = ingest_from_bytes("latin1.csv", bytes, &spec, &IngestionOptions::default()).unwrap();
    assert_eq!(file.sheets[0].rows[0], vec!["José", "Zürich"]);
}

#[test]
fn utf8_bom_is_stripped_from_first_header() {
    let bytes = "\u{feff}姓名,年龄\nAda,36\n".as_bytes();
    let spec = spec(&["姓名"], &[("姓名", "name"), ("年龄", "age")]);
    let file = ingest_from_bytes("bom.csv", bytes, &spec, &IngestionOptions::default()).unwrap();
    assert_eq!(file.sheets[0].header, vec!["name", "age"]);
}

#[test]
fn forced_encoding_that_cannot_decode_reports_line() {
    let opts = IngestionOptions {
        encoding: Some("UTF-8".to_string()),
        ..Default::default()
    };
    let bytes = b"a,b\n1,2\n\xff,3\n";
    let err = ingest_from_bytes("bad.csv", bytes, &spec(&[], &[("a", "a")]), &opts).unwrap_err();
    match err {
        IngestionError::DecodeFailure { encoding, line } => {
            assert_eq!(encoding, "UTF-8");
            assert_eq!(line, 3);
        }
        other => panic!("expected DecodeFailure, got {other}"),
    }
}

#[test]
fn unknown_encoding_label_is_rejected() {
    let opts = IngestionOptions {
        encoding: Some("klingon".to_string()),
        ..Default::default()
    };
    let err = ingest_from_bytes("x.csv", b"a\n1\n", &spec(&[], &[("a", "a")]), &opts).unwrap_err();
    assert!(matches!(err, IngestionError::UnsupportedEncoding { ref label } if label == "klingon"));
}

#[test]
fn ragged_rows_are_padded_and_empty_columns_pruned() {
    let spec = spec(&["a"], &[("a", "A"), ("b", "B"), ("c", "C")]);
    let input = b"a,b,c\n1,,x\n2\n";
    let file = ingest_from_bytes("ragged.csv", input, &spec, &IngestionOptions::default()).unwrap();

    let sheet = &file.sheets[0];
    assert_eq!(sheet.header, vec!["A", "C"]);
    assert_eq!(sheet.rows, vec![vec!["1", "x"], vec!["2", ""]]);
    for row in &sheet.rows {
        assert_eq!(row.len(), sheet.header.len());
    }
}

#[test]
fn rows_with_only_empty_mapped_values_are_dropped() {
    let spec = spec(&[], &[("a", "A"), ("b", "B")]);
    let input = b"a,b,unmapped\n,,zzz\n1,2,\n";
    let file = ingest_from_bytes("sparse.csv", input, &spec, &IngestionOptions::default()).unwrap();
    assert_eq!(file.total_row_count, 1);
    assert_eq!(file.sheets[0].rows[0], vec!["1", "2"]);
}

#[test]
fn missing_required_column_names_exact_missing_set() {
    let spec = spec(&["id", "姓名", "更新时间"], &[("id", "id")]);
    let err = ingest_from_path("tests/fixtures/no_required.csv", &spec, &IngestionOptions::default()).unwrap_err();
    match &err {
        IngestionError::MissingRequiredColumns { sheet, expected, missing } => {
            assert_eq!(sheet, "csv");
            assert_eq!(missing, &vec!["姓名".to_string(), "更新时间".to_string()]);
            assert_eq!(expected.len(), 3);
        }
        other => panic!("expected MissingRequiredColumns, got {other}"),
    }
    assert!(err.to_string().contains("header must contain"));
}

#[test]
fn csv_parser_honors_custom_sheet_name_and_delimiter() {
    let parser = CsvParser {
        delimiter: b'\t',
        sheet_name: "export".to_string(),
        ..Default::default()
    };
    let tables = parser.parse(b"a\tb\n1\t2\n").unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].name, "export");
    assert_eq!(tables[0].header, vec!["a", "b"]);
}
