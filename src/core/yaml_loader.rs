//! Loads one rendered record into a `serde_yaml::Value`.
//!
//! serde_yaml resolves plain scalars with the YAML 1.2 core schema and rejects
//! repeated keys. Supplier templates were written against YAML 1.1 loaders, where
//! `yes`/`off` are booleans, `010` is octal, `1_000` is an integer, `1e3` is text
//! and a repeated key overwrites the earlier one. The document is walked twice:
//! first for its shape, then for the raw text of each scalar, which is resolved here.

use crate::core::ScalarMode;
use regex::Regex;
use serde::de::{
    self, DeserializeSeed, Deserializer, EnumAccess, IgnoredAny, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::sync::LazyLock;

static INT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[-+]?0b[0-1_]+|[-+]?0[0-7_]+|[-+]?(?:0|[1-9][0-9_]*)|[-+]?0x[0-9a-fA-F_]+|[-+]?[1-9][0-9_]*(?::[0-5]?[0-9])+)$",
    )
    .ok()
});

static FLOAT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[-+]?[0-9][0-9_]*\.[0-9_]*(?:[eE][-+][0-9]+)?|\.[0-9_]+(?:[eE][-+][0-9]+)?|[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))$",
    )
    .ok()
});

/// 依設定的純量模式載入單一 YAML 文件
pub fn load_document(text: &str, mode: ScalarMode) -> Result<Value, serde_yaml::Error> {
    let resolve: fn(&str) -> Value = match mode {
        ScalarMode::Yaml12 => return serde_yaml::from_str(text),
        ScalarMode::Typed => resolve_plain,
        ScalarMode::Text => plain_text,
    };

    let shape: Shape = serde_yaml::from_str(text)?;
    Resolve {
        shape: &shape,
        source: text,
        resolve,
    }
    .deserialize(serde_yaml::Deserializer::from_str(text))
}

/// Resolves an unquoted scalar with YAML 1.1 implicit typing.
pub fn resolve_plain(text: &str) -> Value {
    match text {
        "" | "~" | "null" | "Null" | "NULL" => return Value::Null,
        "yes" | "Yes" | "YES" | "true" | "True" | "TRUE" | "on" | "On" | "ON" => {
            return Value::Bool(true)
        }
        "no" | "No" | "NO" | "false" | "False" | "FALSE" | "off" | "Off" | "OFF" => {
            return Value::Bool(false)
        }
        _ => {}
    }

    if pattern_matches(&INT, text) {
        if let Some(value) = construct_int(text) {
            return value;
        }
    }
    if pattern_matches(&FLOAT, text) {
        if let Some(value) = construct_float(text) {
            return value;
        }
    }
    Value::String(text.to_string())
}

fn plain_text(text: &str) -> Value {
    match text {
        "" | "~" | "null" | "Null" | "NULL" => Value::Null,
        _ => Value::String(text.to_string()),
    }
}

fn pattern_matches(pattern: &Option<Regex>, text: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(text))
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    }
}

fn construct_int(text: &str) -> Option<Value> {
    let cleaned = text.replace('_', "");
    let (negative, digits) = split_sign(&cleaned);

    let magnitude: i128 = if digits == "0" {
        0
    } else if let Some(binary) = digits.strip_prefix("0b") {
        i128::from_str_radix(binary, 2).ok()?
    } else if let Some(hex) = digits.strip_prefix("0x") {
        i128::from_str_radix(hex, 16).ok()?
    } else if digits.starts_with('0') {
        i128::from_str_radix(digits, 8).ok()?
    } else if digits.contains(':') {
        // base 60, e.g. 190:20:30
        digits.split(':').try_fold(0i128, |total, part| {
            total.checked_mul(60)?.checked_add(part.parse::<i128>().ok()?)
        })?
    } else {
        digits.parse().ok()?
    };

    let value = if negative { -magnitude } else { magnitude };
    if let Ok(small) = i64::try_from(value) {
        Some(Value::from(small))
    } else {
        // wider than 64 bits stays text
        u64::try_from(value).ok().map(Value::from)
    }
}

fn construct_float(text: &str) -> Option<Value> {
    let cleaned = text.replace('_', "").to_ascii_lowercase();
    let (negative, body) = split_sign(&cleaned);

    let magnitude = if body == ".inf" {
        f64::INFINITY
    } else if body == ".nan" {
        f64::NAN
    } else if body.contains(':') {
        body.split(':').try_fold(0.0f64, |total, part| {
            part.parse::<f64>().ok().map(|part| total * 60.0 + part)
        })?
    } else {
        body.parse::<f64>().ok()?
    };

    Some(Value::from(if negative { -magnitude } else { magnitude }))
}

/// True when `scalar` is a slice of `source` sitting between matching quotes.
fn is_quoted(source: &str, scalar: &str) -> bool {
    let Some(offset) = (scalar.as_ptr() as usize).checked_sub(source.as_ptr() as usize) else {
        return false;
    };
    let end = offset + scalar.len();
    let bytes = source.as_bytes();
    if offset == 0 || end > bytes.len() {
        return false;
    }
    matches!(
        (bytes[offset - 1], bytes.get(end)),
        (b'"', Some(b'"')) | (b'\'', Some(b'\''))
    )
}

enum Shape {
    Null,
    Scalar,
    Tagged,
    Sequence(Vec<Shape>),
    Mapping(Vec<(Shape, Shape)>),
}

impl<'de> Deserialize<'de> for Shape {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ShapeVisitor)
    }
}

struct ShapeVisitor;

impl<'de> Visitor<'de> for ShapeVisitor {
    type Value = Shape;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any YAML value")
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Shape, E> {
        Ok(Shape::Scalar)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Shape, E> {
        Ok(Shape::Scalar)
    }

    fn visit_i128<E: de::Error>(self, _: i128) -> Result<Shape, E> {
        Ok(Shape::Scalar)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Shape, E> {
        Ok(Shape::Scalar)
    }

    fn visit_u128<E: de::Error>(self, _: u128) -> Result<Shape, E> {
        Ok(Shape::Scalar)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Shape, E> {
        Ok(Shape::Scalar)
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<Shape, E> {
        Ok(Shape::Scalar)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Shape, E> {
        Ok(Shape::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Shape, E> {
        Ok(Shape::Null)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Shape, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Shape::Sequence(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Shape, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::new();
        while let Some(entry) = map.next_entry()? {
            entries.push(entry);
        }
        Ok(Shape::Mapping(entries))
    }

    fn visit_enum<A>(self, data: A) -> Result<Shape, A::Error>
    where
        A: EnumAccess<'de>,
    {
        let (_, contents) = data.variant::<IgnoredAny>()?;
        contents.newtype_variant::<IgnoredAny>()?;
        Ok(Shape::Tagged)
    }
}

#[derive(Clone, Copy)]
struct Resolve<'a> {
    shape: &'a Shape,
    source: &'a str,
    resolve: fn(&str) -> Value,
}

impl<'a> Resolve<'a> {
    fn at(&self, shape: &'a Shape) -> Resolve<'a> {
        Resolve {
            shape,
            source: self.source,
            resolve: self.resolve,
        }
    }
}

fn out_of_step<E: de::Error>() -> E {
    E::custom("document changed between reads")
}

impl<'de> DeserializeSeed<'de> for Resolve<'_> {
    type Value = Value;

    fn deserialize<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        match self.shape {
            Shape::Null => {
                IgnoredAny::deserialize(deserializer)?;
                Ok(Value::Null)
            }
            // explicit tags keep serde_yaml's own reading
            Shape::Tagged => Value::deserialize(deserializer),
            Shape::Scalar => deserializer.deserialize_str(self),
            Shape::Sequence(_) => deserializer.deserialize_seq(self),
            Shape::Mapping(_) => deserializer.deserialize_map(self),
        }
    }
}

impl<'de> Visitor<'de> for Resolve<'_> {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a YAML value matching the first read")
    }

    fn visit_borrowed_str<E: de::Error>(self, text: &'de str) -> Result<Value, E> {
        if is_quoted(self.source, text) {
            Ok(Value::String(text.to_string()))
        } else {
            Ok((self.resolve)(text))
        }
    }

    // escaped quotes, block scalars and folded lines never borrow
    fn visit_str<E: de::Error>(self, text: &str) -> Result<Value, E> {
        Ok(Value::String(text.to_string()))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let Shape::Sequence(items) = self.shape else {
            return Err(out_of_step());
        };
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            let value = seq
                .next_element_seed(self.at(item))?
                .ok_or_else(out_of_step)?;
            values.push(value);
        }
        Ok(Value::Sequence(values))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let Shape::Mapping(entries) = self.shape else {
            return Err(out_of_step());
        };
        let mut mapping = Mapping::with_capacity(entries.len());
        for (key_shape, value_shape) in entries {
            let key = map.next_key_seed(self.at(key_shape))?.ok_or_else(out_of_step)?;
            let value = map.next_value_seed(self.at(value_shape))?;
            // a repeated key keeps its first position and takes the later value
            mapping.insert(key, value);
        }
        Ok(Value::Mapping(mapping))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> Mapping {
        match load_document(text, ScalarMode::Typed).unwrap() {
            Value::Mapping(mapping) => mapping,
            other => panic!("expected a mapping, got {:?}", other),
        }
    }

    #[test]
    fn test_yaml11_booleans() {
        let mapping = load("Published: yes\nInStock: off\nFeatured: On\nTaxable: NO");
        assert_eq!(mapping.get("Published"), Some(&Value::Bool(true)));
        assert_eq!(mapping.get("InStock"), Some(&Value::Bool(false)));
        assert_eq!(mapping.get("Featured"), Some(&Value::Bool(true)));
        assert_eq!(mapping.get("Taxable"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_yaml11_integers() {
        let mapping = load("Oct: 010\nSep: 1_000\nHex: 0x1F\nBin: 0b101\nNeg: -42\nSexa: 1:30");
        assert_eq!(mapping.get("Oct").and_then(Value::as_i64), Some(8));
        assert_eq!(mapping.get("Sep").and_then(Value::as_i64), Some(1000));
        assert_eq!(mapping.get("Hex").and_then(Value::as_i64), Some(31));
        assert_eq!(mapping.get("Bin").and_then(Value::as_i64), Some(5));
        assert_eq!(mapping.get("Neg").and_then(Value::as_i64), Some(-42));
        assert_eq!(mapping.get("Sexa").and_then(Value::as_i64), Some(90));
    }

    #[test]
    fn test_exponent_without_dot_stays_text() {
        let mapping = load("Code: 1e3\nOther: 1.0e3\nPrice: 1299.00\nSigned: 1.5e+2");
        assert_eq!(mapping.get("Code"), Some(&Value::String("1e3".into())));
        assert_eq!(mapping.get("Other"), Some(&Value::String("1.0e3".into())));
        assert_eq!(mapping.get("Price").and_then(Value::as_f64), Some(1299.0));
        assert_eq!(mapping.get("Signed").and_then(Value::as_f64), Some(150.0));
    }

    #[test]
    fn test_digits_that_are_not_octal_stay_text() {
        let mapping = load("Code: 0912\nPlain: 0o17");
        assert_eq!(mapping.get("Code"), Some(&Value::String("0912".into())));
        assert_eq!(mapping.get("Plain"), Some(&Value::String("0o17".into())));
    }

    #[test]
    fn test_quoted_scalars_are_never_resolved() {
        let mapping = load("A: \"010\"\nB: 'yes'\nC: \"1_000\"\nD: \"\"\nE: 'it''s'\nF: \"say \\\"on\\\"\"");
        assert_eq!(mapping.get("A"), Some(&Value::String("010".into())));
        assert_eq!(mapping.get("B"), Some(&Value::String("yes".into())));
        assert_eq!(mapping.get("C"), Some(&Value::String("1_000".into())));
        assert_eq!(mapping.get("D"), Some(&Value::String(String::new())));
        assert_eq!(mapping.get("E"), Some(&Value::String("it's".into())));
        assert_eq!(mapping.get("F"), Some(&Value::String("say \"on\"".into())));
    }

    #[test]
    fn test_repeated_key_takes_last_value_in_first_position() {
        let mapping = load("SKU: A\nName: b\nSKU: C");
        let keys: Vec<&str> = mapping.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["SKU", "Name"]);
        assert_eq!(mapping.get("SKU"), Some(&Value::String("C".into())));
    }

    #[test]
    fn test_nested_values_are_resolved() {
        let mapping = load("Sizes: [010, yes, \"010\"]\nMeta:\n  active: on\n  code: 1e3");
        let sizes = mapping.get("Sizes").and_then(Value::as_sequence).unwrap();
        assert_eq!(sizes[0].as_i64(), Some(8));
        assert_eq!(sizes[1], Value::Bool(true));
        assert_eq!(sizes[2], Value::String("010".into()));
        let meta = mapping.get("Meta").and_then(Value::as_mapping).unwrap();
        assert_eq!(meta.get("active"), Some(&Value::Bool(true)));
        assert_eq!(meta.get("code"), Some(&Value::String("1e3".into())));
    }

    #[test]
    fn test_nulls_and_special_floats() {
        let mapping = load("A:\nB: ~\nC: Null\nD: .nan\nE: -.inf");
        assert_eq!(mapping.get("A"), Some(&Value::Null));
        assert_eq!(mapping.get("B"), Some(&Value::Null));
        assert_eq!(mapping.get("C"), Some(&Value::Null));
        assert!(mapping.get("D").and_then(Value::as_f64).is_some_and(f64::is_nan));
        assert_eq!(mapping.get("E").and_then(Value::as_f64), Some(f64::NEG_INFINITY));
    }

    #[test]
    fn test_aliases_resolve_like_their_anchor() {
        let mapping = load("Base: &b 010\nCopy: *b");
        assert_eq!(mapping.get("Copy").and_then(Value::as_i64), Some(8));
    }

    #[test]
    fn test_tagged_values_keep_their_tag() {
        let mapping = load("Price: !money 9.99");
        assert!(matches!(mapping.get("Price"), Some(Value::Tagged(_))));
    }

    #[test]
    fn test_text_mode_keeps_literal_text() {
        let value = load_document("Price: 1.50\nCode: 010\nFlag: yes\nNone: ~", ScalarMode::Text).unwrap();
        let mapping = value.as_mapping().unwrap();
        assert_eq!(mapping.get("Price"), Some(&Value::String("1.50".into())));
        assert_eq!(mapping.get("Code"), Some(&Value::String("010".into())));
        assert_eq!(mapping.get("Flag"), Some(&Value::String("yes".into())));
        assert_eq!(mapping.get("None"), Some(&Value::Null));
    }

    #[test]
    fn test_yaml12_mode_uses_core_schema() {
        let value = load_document("Flag: yes\nCode: 010", ScalarMode::Yaml12).unwrap();
        let mapping = value.as_mapping().unwrap();
        assert_eq!(mapping.get("Flag"), Some(&Value::String("yes".into())));
        assert_eq!(mapping.get("Code"), Some(&Value::String("010".into())));
        assert!(load_document("SKU: A\nSKU: B", ScalarMode::Yaml12).is_err());
    }
}
