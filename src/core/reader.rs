use crate::core::InputRecord;
use crate::utils::error::{ConvertError, Result};
use crate::utils::validation::validate_delimiter;
use encoding_rs::Encoding;
use std::collections::HashMap;

/// Resolves a WHATWG label such as `windows-1252` or `utf-8`.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| ConvertError::UnsupportedEncoding {
        label: label.to_string(),
    })
}

/// 將原始位元組依指定編碼解碼後讀成記錄，空白欄位保持為空字串
pub fn read_records(
    source: &str,
    bytes: &[u8],
    encoding: &'static Encoding,
    delimiter: char,
) -> Result<Vec<InputRecord>> {
    validate_delimiter("input_delimiter", delimiter)?;
    let delimiter = delimiter as u8;

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::warn!(
            "⚠️ {} contains bytes that are not valid {}; they were replaced with U+FFFD",
            source,
            used.name()
        );
    }
    if used != encoding {
        tracing::debug!("Byte order mark switched {} to {}", encoding.name(), used.name());
    }

    let fatal = |message: String| ConvertError::Input {
        path: source.to_string(),
        message,
    };

    if let Some(line) = unterminated_quote(&text, delimiter) {
        return Err(fatal(format!(
            "quoted field starting on line {} is never closed",
            line
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| fatal(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(fatal("missing header row".to_string()));
    }

    let headers = dedupe_headers(headers);

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|e| fatal(e.to_string()))?;
        if row.len() > headers.len() {
            return Err(fatal(format!(
                "row {} has {} fields but the header has {}",
                index + 1,
                row.len(),
                headers.len()
            )));
        }

        let mut fields = HashMap::with_capacity(headers.len());
        for (position, header) in headers.iter().enumerate() {
            let value = row.get(position).unwrap_or_default();
            fields.insert(header.clone(), value.to_string());
        }

        let mut record = InputRecord::new(index + 1, fields);
        if let Some(position) = row.position() {
            record.line = position.line();
        }
        records.push(record);
    }

    tracing::debug!("Read {} rows with {} columns from {}", records.len(), headers.len(), source);
    Ok(records)
}

/// 重複的欄位名稱依序改為 `Name.1`、`Name.2`，第一個保持原名
pub fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut renamed = Vec::with_capacity(headers.len());

    for original in headers {
        let mut name = original.clone();
        let mut count = counts.get(&name).copied().unwrap_or(0);
        while count > 0 {
            counts.insert(name.clone(), count + 1);
            name = format!("{}.{}", name, count);
            count = counts.get(&name).copied().unwrap_or(0);
        }
        if name != original {
            tracing::warn!("⚠️ Duplicate column '{}' renamed to '{}'", original, name);
        }
        counts.insert(name.clone(), count + 1);
        renamed.push(name);
    }
    renamed
}

/// Line on which a quoted field opens without ever being closed.
fn unterminated_quote(text: &str, delimiter: u8) -> Option<u64> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        FieldStart,
        Unquoted,
        Quoted,
        QuoteInQuoted,
    }

    let mut state = State::FieldStart;
    let mut line = 1u64;
    let mut opened_on = 1u64;
    for byte in text.bytes() {
        let at_boundary = byte == delimiter || byte == b'\n' || byte == b'\r';
        state = match state {
            State::FieldStart if byte == b'"' => {
                opened_on = line;
                State::Quoted
            }
            State::FieldStart | State::Unquoted if at_boundary => State::FieldStart,
            State::FieldStart | State::Unquoted => State::Unquoted,
            State::Quoted if byte == b'"' => State::QuoteInQuoted,
            State::Quoted => State::Quoted,
            State::QuoteInQuoted if byte == b'"' => State::Quoted,
            State::QuoteInQuoted if at_boundary => State::FieldStart,
            State::QuoteInQuoted => State::Unquoted,
        };
        if byte == b'\n' {
            line += 1;
        }
    }

    (state == State::Quoted).then_some(opened_on)
}
