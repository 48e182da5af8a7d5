pub mod catalog;
pub mod check;
pub mod element;
pub mod summary;

pub use catalog::{Catalog, CategoryQuery, Discipline};
pub use check::{Check, CheckKey, ProjectComplianceRow, SaveReceipt, ALL_CATEGORIES};
pub use element::{Compliance, ElementRow, PropertyEntry};
pub use summary::{CategorySummary, DisciplineSummary};
