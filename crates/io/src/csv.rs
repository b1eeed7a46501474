// CSV import

use std::io::Read;
use std::path::Path;

use ctrlboard_core::{RawTable, Value};

use crate::error::LoadError;

/// Read a CSV file into a raw table named `table`.
pub fn import(path: &Path, table: &str) -> Result<RawTable, LoadError> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&content, table)
}

/// Parse CSV text with a sniffed delimiter. The first record is the header.
///
/// Rows are read flexibly: a row with the wrong cell count reaches the
/// table shape check and becomes a schema error there.
pub fn import_from_string(content: &str, table: &str) -> Result<RawTable, LoadError> {
    let content = content.trim_start_matches('\u{feff}');
    let delimiter = sniff_delimiter(content);

    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let csv_err = |e: ::csv::Error| LoadError::Csv {
        table: table.to_string(),
        message: e.to_string(),
    };

    let columns: Vec<String> = reader.headers().map_err(csv_err)?.iter().map(String::from).collect();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        rows.push(record.iter().map(Value::from_cell).collect());
    }

    log::debug!("{table}: {} CSV row(s), delimiter {:?}", rows.len(), delimiter as char);
    Ok(RawTable::new(table, columns, rows))
}

/// Delimiter candidates. A tie goes to the earlier entry.
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Records sampled when sniffing.
const SNIFF_RECORDS: usize = 10;

/// Pick the field delimiter from the first records of `content`.
///
/// A candidate qualifies when it splits the header into two or more fields.
/// Qualifying candidates rank by how many sampled records share the header's
/// width, then by that width. Comma is the fallback.
pub fn sniff_delimiter(content: &str) -> u8 {
    let mut best: Option<((usize, usize), u8)> = None;
    for &delimiter in &DELIMITERS {
        let Some(fit) = delimiter_fit(content, delimiter) else {
            continue;
        };
        if best.map_or(true, |(b, _)| fit > b) {
            best = Some((fit, delimiter));
        }
    }
    best.map_or(b',', |(_, d)| d)
}

/// (records as wide as the header, header width), or `None` when the
/// header does not split on `delimiter`.
fn delimiter_fit(content: &str, delimiter: u8) -> Option<(usize, usize)> {
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let widths: Vec<usize> = reader
        .records()
        .take(SNIFF_RECORDS)
        .map_while(Result::ok)
        .map(|r| r.len())
        .collect();
    let header = *widths.first()?;
    if header < 2 {
        return None;
    }
    let agreeing = widths.iter().filter(|&&w| w == header).count();
    Some((agreeing, header))
}

/// Read file and convert to UTF-8 if needed (spreadsheet exports are often Windows-1252)
pub fn read_file_as_utf8(path: &Path) -> Result<String, LoadError> {
    let io_err = |e: std::io::Error| LoadError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let mut file = std::fs::File::open(path).map_err(io_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(io_err)?;
    Ok(decode(bytes))
}

/// UTF-8 when valid, otherwise Windows-1252.
pub fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}
