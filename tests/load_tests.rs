//! Benchmark table loading against the in-memory doubles.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use bq_load_bench::load::{BenchmarkLoadTable, LoadTables};
use bq_load_bench::{LoadSpec, LoadTablesProcessor, BENCHMARK_NAME};

use common::{small_params, string_table, FakeStore, FakeWarehouse};

const BUCKET: &str = "files";
const CSV_ONE: &str =
    "fileType=csv/compression=none/numColumns=10/columnTypes=100_STRING/numFiles=1/tableSize=10MB";
const GZIP_THREE: &str =
    "fileType=csv/compression=gzip/numColumns=10/columnTypes=100_STRING/numFiles=3/tableSize=10MB";

fn spec(duplicate: bool) -> LoadSpec {
    LoadSpec {
        benchmark_name: BENCHMARK_NAME.to_string(),
        bq_project: "bq-proj".to_string(),
        gcs_project: Some("gcs-proj".to_string()),
        staging_project: "staging-proj".to_string(),
        staging_dataset_id: "staging".to_string(),
        dataset_id: "bench".to_string(),
        bucket_name: BUCKET.to_string(),
        results_table_name: "results".to_string(),
        results_dataset_id: "results_ds".to_string(),
        duplicate_benchmark_tables: duplicate,
        file_params: small_params(),
        bq_logs_dataset: "logs".to_string(),
    }
}

fn setup() -> (Arc<FakeWarehouse>, Arc<FakeStore>) {
    let store = Arc::new(FakeStore::default());
    let warehouse = Arc::new(FakeWarehouse::new(store.clone()));
    warehouse.add_table("staging", "100_STRING_10", string_table());
    store.put(BUCKET, &format!("{}/file1.csv", CSV_ONE), 2_500_000);
    for n in 1..=3 {
        store.put(BUCKET, &format!("{}/file{}.gz", GZIP_THREE, n), 500_000);
    }
    (warehouse, store)
}

#[test]
fn test_loads_every_combination_and_records_results() {
    let (warehouse, store) = setup();
    warehouse.answer(
        "cloudaudit_googleapis_com_data_access_20190304",
        vec![json!({"totalSlotMs": "4000", "avgSlots": "0.4"})],
    );
    let processor = LoadTables::new(warehouse.clone(), store, spec(false));

    processor.create_benchmark_tables().unwrap();

    let loads = warehouse.loads.lock().unwrap().clone();
    let uris: Vec<&str> = loads.iter().map(|(_, uri, _)| uri.as_str()).collect();
    assert_eq!(
        uris,
        vec![
            format!("gs://{}/{}/*", BUCKET, GZIP_THREE),
            format!("gs://{}/{}/*", BUCKET, CSV_ONE),
        ]
    );
    assert!(loads.iter().all(|(_, _, options)| options.skip_leading_rows == 1));
    assert!(loads.iter().all(|(table, _, _)| table.dataset == "bench"));

    let inserted = warehouse.inserted.lock().unwrap().clone();
    assert_eq!(inserted.len(), 2);
    let (results_table, row) = &inserted[1];
    assert_eq!(results_table.to_string(), "bq-proj:results_ds.results");
    assert_eq!(row["benchmarkName"], "FILE LOADER");
    assert_eq!(row["job"]["totalSlotMs"], 4000);
    assert_eq!(row["job"]["avgSlots"], 0.4);
    assert_eq!(row["job"]["duration"], 10.0);
    assert_eq!(row["loadProperties"]["numRows"], 500);
    assert_eq!(row["loadProperties"]["fileSize"], 2.5);
    assert_eq!(row["loadProperties"]["compressionType"], "NONE");
    assert_eq!(
        row["loadProperties"]["sourceURI"],
        format!("gs://{}/{}/*", BUCKET, CSV_ONE)
    );
}

#[test]
fn test_csv_tables_take_the_staging_schema() {
    let (warehouse, store) = setup();
    let processor = LoadTables::new(warehouse.clone(), store, spec(false));
    processor.create_benchmark_tables().unwrap();

    let created = warehouse.created.lock().unwrap().clone();
    assert_eq!(created.len(), 2);
    for (table, schema) in created {
        assert_eq!(table.project.as_deref(), Some("bq-proj"));
        assert!(table.table.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(schema, Some(string_table().schema));
    }
}

#[test]
fn test_benchmarked_combinations_are_skipped() {
    let (warehouse, store) = setup();
    warehouse.answer(
        "loadProperties.sourceURI",
        vec![
            json!({"sourceURI": format!("gs://{}/{}/*", BUCKET, CSV_ONE)}),
            json!({"sourceURI": format!("gs://elsewhere/{}/*", GZIP_THREE)}),
            json!({"sourceURI": null}),
        ],
    );
    let processor = LoadTables::new(warehouse.clone(), store, spec(false));

    processor.create_benchmark_tables().unwrap();

    let loads = warehouse.loads.lock().unwrap().clone();
    assert_eq!(loads.len(), 1);
    assert_eq!(loads[0].1, format!("gs://{}/{}/*", BUCKET, GZIP_THREE));
    assert!(warehouse.queries.lock().unwrap()[0]
        .contains("FROM `bq-proj.results_ds.results`"));
}

#[test]
fn test_duplicates_load_benchmarked_combinations_again() {
    let (warehouse, store) = setup();
    warehouse.answer(
        "loadProperties.sourceURI",
        vec![json!({"sourceURI": format!("gs://{}/{}/*", BUCKET, CSV_ONE)})],
    );
    let processor = LoadTables::new(warehouse.clone(), store, spec(true));

    processor.create_benchmark_tables().unwrap();

    assert_eq!(warehouse.loads.lock().unwrap().len(), 2);
}

#[test]
fn test_failed_load_deletes_table_and_records_nothing() {
    let (warehouse, store) = setup();
    warehouse.fail_loads.store(true, Ordering::SeqCst);
    let processor = LoadTables::new(warehouse.clone(), store, spec(false));

    processor.create_benchmark_tables().unwrap();

    let created: Vec<_> = warehouse
        .created
        .lock()
        .unwrap()
        .iter()
        .map(|(t, _)| t.clone())
        .collect();
    assert_eq!(*warehouse.deleted.lock().unwrap(), created);
    assert!(warehouse.inserted.lock().unwrap().is_empty());
}

#[test]
fn test_self_describing_files_get_no_schema() {
    let (warehouse, store) = setup();
    let spec = spec(false);
    let avro = "fileType=avro/compression=snappy/numColumns=10/columnTypes=100_STRING/numFiles=1/tableSize=10MB";
    store.put(BUCKET, &format!("{}/file1.snappy", avro), 1_000_000);

    let table = BenchmarkLoadTable::new(warehouse.as_ref(), store.as_ref(), &spec, avro).unwrap();
    assert_eq!(table.source_uri(), format!("gs://{}/{}/*", BUCKET, avro));
    table.load().unwrap();

    let created = warehouse.created.lock().unwrap().clone();
    assert_eq!(created[0].1, None);
    let loads = warehouse.loads.lock().unwrap().clone();
    assert_eq!(loads[0].2.source_format, "AVRO");
    assert_eq!(loads[0].2.skip_leading_rows, 0);
}

#[test]
fn test_load_table_rejects_unknown_layout() {
    let (warehouse, store) = setup();
    let spec = spec(false);
    assert!(
        BenchmarkLoadTable::new(warehouse.as_ref(), store.as_ref(), &spec, "misc/file1.csv")
            .is_err()
    );
}
