//! Decoding and tabular parsing of uploaded CSV files

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use csv::{ReaderBuilder, Trim};
use encoding_rs::{Encoding, SHIFT_JIS, UTF_8};

use super::error::ImportError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Declared encoding of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    ShiftJis,
    Utf8,
}

impl SourceEncoding {
    fn encoding(&self) -> &'static Encoding {
        match self {
            SourceEncoding::ShiftJis => SHIFT_JIS,
            SourceEncoding::Utf8 => UTF_8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceEncoding::ShiftJis => "Shift_JIS",
            SourceEncoding::Utf8 => "UTF-8",
        }
    }
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sjis" | "shift_jis" | "shiftjis" | "cp932" | "windows_31j" | "ms932" => Ok(SourceEncoding::ShiftJis),
            "utf8" | "utf_8" => Ok(SourceEncoding::Utf8),
            other => Err(format!("unknown encoding: {other}")),
        }
    }
}

/// One data row: trimmed cells aligned with the header row
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRecord {
    /// 1-based line in the file, header is line 1
    pub line: usize,
    pub cells: Vec<String>,
}

/// Header row plus every non-empty data row, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCsv {
    pub encoding: SourceEncoding,
    pub headers: Vec<String>,
    pub records: Vec<CsvRecord>,
}

/// Decode the raw upload. A UTF-8 byte-order mark always wins over the
/// declared encoding since Excel writes one for "CSV UTF-8" exports.
pub fn decode(bytes: &[u8], declared: SourceEncoding) -> Result<(Cow<'_, str>, SourceEncoding), ImportError> {
    let (bytes, encoding) = match bytes.strip_prefix(UTF8_BOM) {
        Some(rest) => (rest, SourceEncoding::Utf8),
        None => (bytes, declared),
    };

    encoding
        .encoding()
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| (text, encoding))
        .ok_or(ImportError::Undecodable { encoding: encoding.name() })
}

/// Parse decoded text into rows. Inconsistent column counts are fatal;
/// blank lines and rows with only empty cells are skipped.
pub fn parse(text: &str, encoding: SourceEncoding) -> Result<ParsedCsv, ImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(String::is_empty) {
        return Err(ImportError::EmptyFile);
    }

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(idx + 2);
        records.push(CsvRecord {
            line,
            cells: record.iter().map(str::to_string).collect(),
        });
    }

    Ok(ParsedCsv { encoding, headers, records })
}

/// Decode and parse an upload in one step
pub fn read_upload(bytes: &[u8], declared: SourceEncoding) -> Result<ParsedCsv, ImportError> {
    let (text, encoding) = decode(bytes, declared)?;
    parse(&text, encoding)
}
