use crate::core::OutputRecord;
use crate::utils::error::{ConvertError, Result};
use crate::utils::validation::validate_delimiter;
use serde_yaml::Value;
use std::collections::HashSet;

/// Union of keys over all records, in the order they were first seen.
///
/// Keys are compared as YAML values, so `1` and `"1"` stay separate columns
/// even though both headers read `1`.
pub fn collect_columns(records: &[OutputRecord]) -> Vec<&Value> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for record in records {
        for key in record.keys() {
            if seen.insert(key) {
                columns.push(key);
            }
        }
    }
    columns
}

/// 將 YAML 值格式化為 CSV 儲存格文字，布林與浮點數採用 pandas 的寫法
pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(float) if n.is_f64() => format_float(float),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => format_cell(&tagged.value),
        nested => serde_json::to_string(nested).unwrap_or_else(|_| {
            serde_yaml::to_string(nested)
                .map(|yaml| yaml.trim_end().to_string())
                .unwrap_or_default()
        }),
    }
}

/// Shortest round-trip form; exponent notation below 1e-4 and from 1e16 up.
fn format_float(value: f64) -> String {
    if value.is_nan() {
        return String::new();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if value == 0.0 || (-4..16).contains(&exponent) {
        let plain = value.to_string();
        if plain.contains('.') {
            plain
        } else {
            format!("{}.0", plain)
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}

/// 序列化所有記錄為 CSV，缺少的欄位留空
pub fn write_csv(records: &[OutputRecord], delimiter: char) -> Result<Vec<u8>> {
    validate_delimiter("output_delimiter", delimiter)?;

    let columns = collect_columns(records);
    if columns.is_empty() {
        if !records.is_empty() {
            tracing::warn!(
                "⚠️ {} records converted but none has a key, writing an empty file",
                records.len()
            );
        }
        return Ok(Vec::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter as u8)
        .from_writer(Vec::new());

    writer.write_record(columns.iter().map(|key| format_cell(key)))?;
    for record in records {
        let cells = columns.iter().map(|key| {
            record
                .fields
                .get(*key)
                .map(format_cell)
                .unwrap_or_default()
        });
        writer.write_record(cells)?;
    }

    writer.into_inner().map_err(|e| ConvertError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record_parser::{parse_record, ParseOutcome};
    use crate::core::ScalarMode;

    fn record(text: &str) -> OutputRecord {
        match parse_record(text, ScalarMode::Typed).unwrap() {
            ParseOutcome::Parsed(record) => record,
            ParseOutcome::Empty => panic!("expected a record"),
        }
    }

    #[test]
    fn test_columns_are_union_in_first_seen_order() {
        let records = vec![
            record("SKU: A1\nName: Fridge"),
            record("SKU: A2\nPrice: 10\nName: Freezer"),
            record("Stock: 3"),
        ];
        let columns: Vec<String> = collect_columns(&records).into_iter().map(format_cell).collect();
        assert_eq!(columns, vec!["SKU", "Name", "Price", "Stock"]);
    }

    #[test]
    fn test_missing_columns_are_written_empty() {
        let records = vec![record("SKU: A1\nName: Fridge"), record("SKU: A2\nPrice: 9.99")];
        let csv = String::from_utf8(write_csv(&records, ',').unwrap()).unwrap();
        assert_eq!(csv, "SKU,Name,Price\nA1,Fridge,\nA2,,9.99\n");
    }

    #[test]
    fn test_no_records_gives_empty_output() {
        assert!(write_csv(&[], ',').unwrap().is_empty());
    }

    #[test]
    fn test_cell_formatting() {
        let records = vec![record(
            "Published: true\nTax: ~\nImages: [a.jpg, b.jpg]\nNote: \"has, comma\"",
        )];
        let csv = String::from_utf8(write_csv(&records, ',').unwrap()).unwrap();
        assert_eq!(
            csv,
            "Published,Tax,Images,Note\nTrue,,\"[\"\"a.jpg\"\",\"\"b.jpg\"\"]\",\"has, comma\"\n"
        );
    }

    #[test]
    fn test_tab_delimiter() {
        let records = vec![record("SKU: A1\nName: Fridge")];
        let csv = String::from_utf8(write_csv(&records, '\t').unwrap()).unwrap();
        assert_eq!(csv, "SKU\tName\nA1\tFridge\n");
    }

    #[test]
    fn test_keys_with_same_text_stay_separate() {
        let records = vec![record("1: int key\n\"1\": string key")];
        let csv = String::from_utf8(write_csv(&records, ',').unwrap()).unwrap();
        assert_eq!(csv, "1,1\nint key,string key\n");
    }

    #[test]
    fn test_floats_and_booleans_follow_pandas() {
        let records = vec![record(
            "A: 1299.00\nB: .nan\nC: -.inf\nD: 1.5e+20\nE: 0.00001\nF: no\nG: 42",
        )];
        let csv = String::from_utf8(write_csv(&records, ',').unwrap()).unwrap();
        assert_eq!(csv, "A,B,C,D,E,F,G\n1299.0,,-inf,1.5e+20,1e-05,False,42\n");
    }

    #[test]
    fn test_records_without_keys_give_empty_output() {
        let records = vec![record("{}"), record("{}")];
        assert!(write_csv(&records, ',').unwrap().is_empty());
    }

    #[test]
    fn test_non_ascii_delimiter_is_rejected() {
        let records = vec![record("SKU: A1")];
        assert!(matches!(
            write_csv(&records, '¦'),
            Err(ConvertError::InvalidConfigValue { .. })
        ));
    }
}
