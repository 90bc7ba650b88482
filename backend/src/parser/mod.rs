//! CSV reader with encoding and delimiter auto-detection.
//!
//! Turns uploaded bytes into a [`Table`] of string cells. Typing and
//! cleaning happen later in [`crate::transform::normalize`].

use std::path::Path;

pub use crate::error::CsvError;
use crate::error::CsvResult;
use crate::models::Table;

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Header row and data cells
    pub table: Table,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown encodings and invalid UTF-8 fall back to a lossy conversion.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let text = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    // Spreadsheet exports often start with a BOM
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Ties and lines without any candidate fall back to a comma.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
///
/// Headers are kept verbatim (whitespace included). Rows shorter than the
/// header are padded with empty cells, longer rows are truncated, and
/// blank lines are skipped.
///
/// # Example
/// ```ignore
/// use costimpact::parse_csv;
///
/// let table = parse_csv("SKU,Revenue_1\nabc1,1000", ',').unwrap();
/// assert_eq!(table.headers, vec!["SKU", "Revenue_1"]);
/// assert_eq!(table.rows[0][0], "abc1");
/// ```
pub fn parse_csv(content: &str, delimiter: char) -> CsvResult<Table> {
    if content.trim().is_empty() {
        return Err(CsvError::new(1, "Empty CSV file"));
    }

    let delimiter = u8::try_from(delimiter)
        .map_err(|_| CsvError::new(1, format!("Unsupported delimiter '{}'", delimiter)))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CsvError::new(1, format!("Cannot read header: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(CsvError::new(1, "No headers found"));
    }

    let mut rows = Vec::new();

    for (row_idx, record) in reader.records().enumerate() {
        let line_num = row_idx + 2; // +1 for 0-index, +1 for header

        let record = record.map_err(|e| {
            let line = e.position().map(|p| p.line() as usize).unwrap_or(line_num);
            CsvError::new(line, format!("Cannot read line: {}", e))
        })?;

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let row: Vec<String> = (0..headers.len())
            .map(|i| record.get(i).unwrap_or("").to_string())
            .collect();

        rows.push(row);
    }

    Ok(Table::new(headers, rows))
}

/// Parse CSV file with auto-detection of encoding and delimiter.
///
/// # Example
/// ```ignore
/// let result = parse_csv_file_auto("/path/to/sales_ytd.csv")?;
/// println!("Encoding: {}, Delimiter: '{}'", result.encoding, result.delimiter);
/// println!("Rows: {}", result.table.len());
/// ```
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref()).map_err(|e| {
        CsvError::new(0, format!("Cannot read file '{}': {}", path.as_ref().display(), e))
    })?;

    parse_bytes_auto(&bytes)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let table = parse_csv(&content, delimiter)?;

    Ok(ParseResult {
        table,
        encoding,
        delimiter,
    })
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_simple_csv() {
        let table = parse_csv("SKU,Revenue_1\nA1,1000\nB2,250", ',').unwrap();

        assert_eq!(table.headers, vec!["SKU", "Revenue_1"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], vec!["A1", "1000"]);
        assert_eq!(table.rows[1], vec!["B2", "250"]);
    }

    #[test]
    fn test_quoted_values_with_delimiter_inside() {
        let csv = "SKU,Product_Family\n\"A1\",\"Tools, Hand\"";
        let table = parse_csv(csv, ',').unwrap();

        assert_eq!(table.rows[0][0], "A1");
        assert_eq!(table.rows[0][1], "Tools, Hand");
    }

    #[test]
    fn test_headers_kept_verbatim() {
        let table = parse_csv(" SKU , TTL_Cost\nA,1", ',').unwrap();
        assert_eq!(table.headers, vec![" SKU ", " TTL_Cost"]);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse_csv("a;b\n1;2\n\n3;4\n", ';').unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_short_rows_padded_and_long_rows_truncated() {
        let table = parse_csv("a,b,c\n1\n1,2,3,4", ',').unwrap();

        assert_eq!(table.rows[0], vec!["1", "", ""]);
        assert_eq!(table.rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_empty_csv_error() {
        let err = parse_csv("", ',').unwrap_err();
        assert!(err.message.contains("Empty"));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("SKU"), ',');
    }

    #[test]
    fn test_auto_parse_semicolon() {
        let csv = "SKU;Revenue_1\nA1;30\nB2;25";
        let result = parse_bytes_auto(csv.as_bytes()).unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.table.len(), 2);
        assert_eq!(result.table.headers, vec!["SKU", "Revenue_1"]);
    }

    #[test]
    fn test_bom_is_stripped() {
        let bytes = "\u{feff}SKU,Revenue_1\nA1,10".as_bytes();
        let result = parse_bytes_auto(bytes).unwrap();
        assert_eq!(result.table.headers[0], "SKU");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_parse_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "SKU,Product_Family,Product_Group").unwrap();
        writeln!(file, "a1,Tools,Hand Tools").unwrap();

        let result = parse_csv_file_auto(file.path()).unwrap();
        assert_eq!(result.delimiter, ',');
        assert_eq!(result.table.rows[0], vec!["a1", "Tools", "Hand Tools"]);
    }

    #[test]
    fn test_missing_file_error() {
        let err = parse_csv_file_auto("/nonexistent/cost_file.csv").unwrap_err();
        assert!(err.message.contains("Cannot read file"));
    }
}
