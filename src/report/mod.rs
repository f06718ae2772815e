//! Presentation layer: terminal rendering and file export of audit reports.

pub mod display;
pub mod export;

pub use display::print_audit_report;
pub use export::{export_audit_csv, export_report, render_json, write_json};
