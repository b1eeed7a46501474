use std::fmt;
use std::path::PathBuf;

use ctrlboard_core::SchemaError;

#[derive(Debug)]
pub enum LoadError {
    /// Local file could not be read.
    Io { path: PathBuf, message: String },
    /// Non-success HTTP status after retries.
    Http { status: u16, url: String },
    /// Transport failure (DNS, TLS, timeout) after retries.
    Network { url: String, message: String },
    /// Malformed CSV.
    Csv { table: String, message: String },
    /// Malformed JSON.
    Json { table: String, message: String },
    /// Parsed, but not a usable table.
    Schema { table: String, source: SchemaError },
    /// A required sheet is not available from the source.
    MissingTable(String),
}

impl LoadError {
    pub fn schema(source: SchemaError) -> Self {
        Self::Schema {
            table: source.table().to_string(),
            source,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::Http { status, url } => write!(f, "HTTP {status} from {url}"),
            Self::Network { url, message } => write!(f, "request to {url} failed: {message}"),
            Self::Csv { table, message } => write!(f, "{table}: CSV error: {message}"),
            Self::Json { table, message } => write!(f, "{table}: JSON error: {message}"),
            Self::Schema { source, .. } => write!(f, "{source}"),
            Self::MissingTable(sheet) => write!(f, "sheet '{sheet}' not found in source"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Schema { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<SchemaError> for LoadError {
    fn from(e: SchemaError) -> Self {
        Self::schema(e)
    }
}
