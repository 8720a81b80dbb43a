use std::fs;

use sheet_ingest::execution::{BatchEngine, BatchOptions, BatchSummary};
use sheet_ingest::ingestion::{IngestionOptions, IngestionRequest};
use sheet_ingest::types::{ColumnMapping, ColumnSpec, RequiredColumns};
use sheet_ingest::IngestionError;

fn spec() -> ColumnSpec {
    let required: RequiredColumns = ["姓名"].into_iter().collect();
    let mapping: ColumnMapping = [("姓名", "name"), ("备注", "remark")].into_iter().collect();
    ColumnSpec::new(required, mapping)
}

#[test]
fn batch_returns_outcomes_in_request_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = Vec::new();
    for i in 0..16 {
        let p = dir.path().join(format!("f{i:02}.csv"));
        // Even files populate 备注, odd files leave it empty.
        let remark = if i % 2 == 0 { "note" } else { "" };
        fs::write(&p, format!("姓名,备注\nrow{i},{remark}\n")).unwrap();
        paths.push(p);
    }
    paths.push(dir.path().join("bad.txt"));

    let engine = BatchEngine::new(BatchOptions { num_threads: Some(4) });
    let outcomes = engine.run_paths(&paths, &spec(), &IngestionOptions::default());

    assert_eq!(outcomes.len(), paths.len());
    for (i, outcome) in outcomes.iter().take(16).enumerate() {
        assert_eq!(outcome.path, paths[i]);
        let file = outcome.result.as_ref().unwrap();
        let sheet = &file.sheets[0];
        assert_eq!(sheet.rows[0][0], format!("row{i}"));
        if i % 2 == 0 {
            assert_eq!(sheet.header, vec!["name", "remark"]);
        } else {
            assert_eq!(sheet.header, vec!["name"]);
        }
    }
    assert!(matches!(
        outcomes[16].result,
        Err(IngestionError::UnsupportedFormat { .. })
    ));

    let summary = BatchSummary::from_outcomes(&outcomes);
    assert_eq!(summary.files, 17);
    assert_eq!(summary.succeeded, 16);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.rows, 16);
}

#[test]
fn requests_carry_their_own_spec() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("people.csv");
    fs::write(&p, "姓名,id\nAda,1\n").unwrap();

    let strict = ColumnSpec::new(["id", "missing"].into_iter().collect(), spec().mapping);
    let requests = vec![
        IngestionRequest::new(&p, spec(), IngestionOptions::default()),
        IngestionRequest::new(&p, strict, IngestionOptions::default()),
    ];

    let engine = BatchEngine::new(BatchOptions { num_threads: Some(2) });
    assert_eq!(engine.num_threads(), 2);
    let outcomes = engine.run(&requests);

    assert!(outcomes[0].is_ok());
    assert!(matches!(
        outcomes[1].result,
        Err(IngestionError::MissingRequiredColumns { ref missing, .. }) if missing == &vec!["missing".to_string()]
    ));
}
