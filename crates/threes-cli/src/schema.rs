pub mod run_summary;
pub mod weight_report;
