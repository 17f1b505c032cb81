// External crates
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;

// Internal modules
use crate::error::{SpamError, SpamResult};

/// Byte encoding of an input text file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// ISO-8859-1: every byte is one code point
    #[default]
    Latin1,
    /// UTF-8; invalid sequences are replaced with U+FFFD
    Utf8,
}

impl TextEncoding {
    /// Decode raw file bytes into a UTF-8 string
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

/// Read a delimited text file into a DataFrame of string columns
///
/// The header row is kept as the first data row so that files with blank or
/// duplicated header cells still parse; callers decide what to do with it.
/// Lines with more fields than the first line are truncated.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
/// * `encoding` - Byte encoding of the file
///
/// # Returns
///
/// Returns a DataFrame where every column is a String column named `column_N`
pub fn read_text_csv<P: AsRef<Path>>(file_path: P, encoding: TextEncoding) -> SpamResult<DataFrame> {
    let path = file_path.as_ref();
    if !path.exists() {
        return Err(SpamError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )));
    }

    let bytes = std::fs::read(path)?;
    let decoded = encoding.decode(&bytes);
    read_text_csv_from_str(decoded)
}

/// Parse already-decoded CSV text, see [`read_text_csv`]
pub fn read_text_csv_from_str(text: String) -> SpamResult<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(false)
        // Zero inference rows reads every column as String
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_truncate_ragged_lines(true))
        .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
        .finish()?;
    Ok(df)
}
