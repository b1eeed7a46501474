//! `ctrlboard-core` - shared data model for the reconciliation engine.
//!
//! Tables arrive from the spreadsheet source as loosely typed records. This
//! crate owns the cell value type, the table/record views the engine reads
//! through, the upstream column labels, and the declared field catalog.

pub mod columns;
pub mod error;
pub mod fields;
pub mod table;
pub mod text;
pub mod value;

pub use columns::ColumnNames;
pub use error::SchemaError;
pub use fields::{FieldKind, FieldSpec};
pub use table::{RawTable, RecordRef, Table};
pub use text::{normalize_display, normalize_match};
pub use value::Value;
