//! bq-load-bench - benchmark BigQuery file loads
//!
//! See the library crate documentation for the phases a run can include.

mod cli;

fn main() {
    cli::run();
}
