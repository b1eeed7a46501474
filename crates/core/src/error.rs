use std::fmt;

/// Input is not a well-formed table. Fatal for the table being loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A row does not have one cell per column.
    RaggedRow { table: String, row: usize, expected: usize, found: usize },
    /// Two columns share a label after whitespace is stripped.
    DuplicateColumn { table: String, column: String },
    /// Records do not share one set of fields, or the payload is not a list of records.
    NotTabular { table: String, reason: String },
}

impl SchemaError {
    pub fn table(&self) -> &str {
        match self {
            Self::RaggedRow { table, .. }
            | Self::DuplicateColumn { table, .. }
            | Self::NotTabular { table, .. } => table,
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RaggedRow { table, row, expected, found } => write!(
                f,
                "table '{table}': row {row} has {found} cell(s), expected {expected}"
            ),
            Self::DuplicateColumn { table, column } => {
                write!(f, "table '{table}': duplicate column '{column}'")
            }
            Self::NotTabular { table, reason } => {
                write!(f, "table '{table}': not tabular: {reason}")
            }
        }
    }
}

impl std::error::Error for SchemaError {}
