//! Benchmarks for bq-load-bench
//!
//! Run with: cargo bench

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use bq_load_bench::bucket::{candidate_paths, existing_paths};
use bq_load_bench::cloud::ObjectStore;
use bq_load_bench::schema::{summarize_column_types, ColumnMix};
use bq_load_bench::{CombinationPath, RestartPoint, Result, SchemaCreator, FILE_PARAMETERS};

/// Object store that answers every probe without I/O.
struct CountingStore {
    probes: AtomicU64,
}

impl ObjectStore for CountingStore {
    fn exists(&self, _bucket: &str, name: &str) -> Result<bool> {
        self.probes.fetch_add(1, Ordering::Relaxed);
        Ok(name.contains("fileType=csv"))
    }

    fn size(&self, _bucket: &str, _name: &str) -> Result<u64> {
        Ok(0)
    }

    fn copy(&self, _bucket: &str, _source: &str, _destination: &str) -> Result<()> {
        Ok(())
    }

    fn list(&self, _bucket: &str, _prefix: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn compose(&self, _bucket: &str, _sources: &[String], _destination: &str) -> Result<()> {
        Ok(())
    }

    fn delete(&self, _bucket: &str, _names: &[String]) -> Result<()> {
        Ok(())
    }
}

fn bench_schema_fields() {
    println!("\n1. Schema Fields (fields_for + summary)");
    println!("{:-<60}", "");

    for column_types in &FILE_PARAMETERS.column_types {
        let mix = ColumnMix::parse(column_types).unwrap();
        for &num_columns in &[10u32, 100, 1000, 10_000] {
            let iterations = 200;
            let start = Instant::now();
            for _ in 0..iterations {
                let fields = SchemaCreator::fields_for(&mix, num_columns);
                let _ = summarize_column_types(&fields);
            }
            let elapsed = start.elapsed();
            let avg_us = elapsed.as_secs_f64() * 1_000_000.0 / iterations as f64;
            println!(
                "  {:<22} {:>6} columns: {:>10.2}us avg",
                column_types, num_columns, avg_us
            );
        }
    }
}

fn bench_path_parsing() {
    println!("\n2. Combination Path Parsing");
    println!("{:-<60}", "");

    let paths: Vec<String> = candidate_paths(&FILE_PARAMETERS)
        .iter()
        .map(|p| format!("gs://bench_files/{}*", p.dir()))
        .collect();

    let start = Instant::now();
    let mut parsed = 0;
    for uri in &paths {
        if uri.parse::<CombinationPath>().is_ok() {
            parsed += 1;
        }
    }
    let elapsed = start.elapsed();
    println!(
        "  {:>5} URIs: {:>8.2}ms ({:>10.0} paths/sec)",
        parsed,
        elapsed.as_secs_f64() * 1000.0,
        parsed as f64 / elapsed.as_secs_f64()
    );

    let files: Vec<String> = candidate_paths(&FILE_PARAMETERS)
        .iter()
        .map(|p| p.file_name(p.num_files))
        .collect();
    let start = Instant::now();
    let restarts = files
        .iter()
        .filter(|f| f.parse::<RestartPoint>().is_ok())
        .count();
    let elapsed = start.elapsed();
    println!(
        "  {:>5} restart points: {:>8.2}ms",
        restarts,
        elapsed.as_secs_f64() * 1000.0
    );
}

fn bench_existing_paths() {
    println!("\n3. Existing Combination Probes");
    println!("{:-<60}", "");

    let store = CountingStore {
        probes: AtomicU64::new(0),
    };
    let start = Instant::now();
    let found = existing_paths(&store, "bench_files", &FILE_PARAMETERS).unwrap();
    let elapsed = start.elapsed();
    println!(
        "  {:>5} probes, {:>5} found: {:>8.2}ms ({} threads)",
        store.probes.load(Ordering::Relaxed),
        found.len(),
        elapsed.as_secs_f64() * 1000.0,
        rayon::current_num_threads()
    );
}

fn main() {
    println!("bq-load-bench Benchmarks\n");
    println!("{:=<60}", "");

    bench_schema_fields();
    bench_path_parsing();
    bench_existing_paths();

    println!("\n{:=<60}", "");
    println!("Benchmarks complete.");
}
