use crate::core::yaml_loader::load_document;
use crate::core::{OutputRecord, ScalarMode};
use crate::utils::error::{ConvertError, Result};
use serde_yaml::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Nothing to convert; the row is dropped without counting as a failure.
    Empty,
    Parsed(OutputRecord),
}

pub fn parse_record(text: &str, mode: ScalarMode) -> Result<ParseOutcome> {
    let blank = text
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'));
    if blank {
        return Ok(ParseOutcome::Empty);
    }

    match load_document(text, mode)? {
        Value::Null => Ok(ParseOutcome::Empty),
        Value::Mapping(mapping) => Ok(ParseOutcome::Parsed(OutputRecord::new(mapping))),
        other => Err(ConvertError::RecordParse {
            message: format!("expected a mapping of column names, found {}", kind(&other)),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
