//! Study Export - session record output
//!
//! Renders a completed (or partial) session record as the CSV file handed to
//! the researchers, and as the summary printed on the completion screen.

#![warn(unreachable_pub)]

pub mod csv;
pub mod error;
pub mod summary;

pub use csv::{export_csv, file_name, timestamp, write_csv, HEADER};
pub use error::ExportError;
pub use summary::SessionSummary;
