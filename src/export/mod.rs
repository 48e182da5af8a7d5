pub mod csv;
pub mod json;

pub use crate::error::ExportError;
pub use csv::export_rows_csv;
pub use json::export_result_json;
