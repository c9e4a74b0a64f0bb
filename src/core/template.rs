use crate::core::{InputRecord, MissingFieldPolicy, Storage};
use crate::utils::error::{ConvertError, Result};
use regex::Regex;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A supplier template: text with `{{ column }}` placeholders.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(name: &str, source: &str) -> Result<Self> {
        let re = Regex::new(r"\{\{\s*(.*?)\s*\}\}").map_err(|e| ConvertError::Template {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        // 模板檔以文字模式讀取，統一換行符號
        let source = source.replace("\r\n", "\n");

        let mut segments = Vec::new();
        let mut last = 0;
        for caps in re.captures_iter(&source) {
            let (Some(whole), Some(field)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if field.as_str().is_empty() {
                return Err(ConvertError::Template {
                    name: name.to_string(),
                    message: format!("empty placeholder at byte {}", whole.start()),
                });
            }
            if whole.start() > last {
                segments.push(Segment::Literal(source[last..whole.start()].to_string()));
            }
            segments.push(Segment::Field(field.as_str().to_string()));
            last = whole.end();
        }
        if last < source.len() {
            segments.push(Segment::Literal(source[last..].to_string()));
        }

        for segment in &segments {
            if let Segment::Literal(text) = segment {
                if let Some(offset) = text.find("{{") {
                    return Err(ConvertError::Template {
                        name: name.to_string(),
                        message: format!("unterminated placeholder near '{}'", preview(&text[offset..])),
                    });
                }
            }
        }

        Ok(Self {
            name: name.to_string(),
            segments,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column names referenced by the template, in order of first use.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Field(field) = segment {
                if !fields.contains(&field.as_str()) {
                    fields.push(field);
                }
            }
        }
        fields
    }

    pub fn render(&self, record: &InputRecord, policy: MissingFieldPolicy) -> Result<String> {
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Field(field) => match (record.get(field), policy) {
                    (Some(value), _) => output.push_str(value),
                    (None, MissingFieldPolicy::Empty) => {}
                    (None, MissingFieldPolicy::Error) => {
                        return Err(ConvertError::MissingField {
                            field: field.clone(),
                        })
                    }
                },
            }
        }
        Ok(output)
    }
}

/// Collapses CR+LF pairs so a rendered value stays on one YAML line.
pub fn normalize_line_breaks(rendered: &str, replacement: &str) -> String {
    rendered.replace("\r\n", replacement)
}

fn preview(text: &str) -> String {
    text.chars().take(24).collect()
}

/// Loads templates by name from a directory, or by explicit path.
pub struct TemplateStore<'a, S: Storage> {
    storage: &'a S,
    directory: String,
}

impl<'a, S: Storage> TemplateStore<'a, S> {
    pub fn new(storage: &'a S, directory: impl Into<String>) -> Self {
        Self {
            storage,
            directory: directory.into(),
        }
    }

    pub fn resolve(&self, identifier: &str) -> String {
        let is_path = identifier.contains('/') || identifier.contains('\\');
        if is_path || self.directory.is_empty() {
            identifier.to_string()
        } else {
            Path::new(&self.directory)
                .join(identifier)
                .to_string_lossy()
                .into_owned()
        }
    }

    pub fn load(&self, identifier: &str) -> Result<Template> {
        let path = self.resolve(identifier);
        tracing::debug!("Loading template '{}' from {}", identifier, path);

        let bytes = self.storage.read_file(&path).map_err(|e| ConvertError::Template {
            name: identifier.to_string(),
            message: format!("cannot read {}: {}", path, e),
        })?;
        let source = String::from_utf8(bytes).map_err(|e| ConvertError::Template {
            name: identifier.to_string(),
            message: format!("{} is not UTF-8: {}", path, e),
        })?;

        Template::parse(identifier, &source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn record(pairs: &[(&str, &str)]) -> InputRecord {
        let fields: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        InputRecord::new(1, fields)
    }

    #[test]
    fn test_render_substitutes_fields() {
        let template = Template::parse("widget", "name: {{name}}\nprice: {{price}}").unwrap();
        let rendered = template
            .render(&record(&[("name", "Widget"), ("price", "9.99")]), MissingFieldPolicy::Empty)
            .unwrap();
        assert_eq!(rendered, "name: Widget\nprice: 9.99");
    }

    #[test]
    fn test_placeholder_whitespace_and_spaced_names() {
        let template = Template::parse("brema", "Name: \"{{  Product Name }}\"").unwrap();
        let rendered = template
            .render(&record(&[("Product Name", "Ice maker")]), MissingFieldPolicy::Empty)
            .unwrap();
        assert_eq!(rendered, "Name: \"Ice maker\"");
        assert_eq!(template.fields(), vec!["Product Name"]);
    }

    #[test]
    fn test_missing_field_empty_policy() {
        let template = Template::parse("t", "sku: {{sku}}\nbrand: {{brand}}").unwrap();
        let rendered = template
            .render(&record(&[("sku", "A1")]), MissingFieldPolicy::Empty)
            .unwrap();
        assert_eq!(rendered, "sku: A1\nbrand: ");
    }

    #[test]
    fn test_missing_field_error_policy() {
        let template = Template::parse("t", "brand: {{brand}}").unwrap();
        let err = template
            .render(&record(&[("sku", "A1")]), MissingFieldPolicy::Error)
            .unwrap_err();
        assert!(matches!(err, ConvertError::MissingField { field } if field == "brand"));
    }

    #[test]
    fn test_unterminated_placeholder_is_rejected() {
        assert!(matches!(
            Template::parse("broken", "name: {{name"),
            Err(ConvertError::Template { .. })
        ));
        assert!(Template::parse("broken", "name: {{ }}").is_err());
    }

    #[test]
    fn test_template_crlf_is_normalized_on_parse() {
        let template = Template::parse("t", "a: {{a}}\r\nb: {{b}}\r\n").unwrap();
        let rendered = template
            .render(&record(&[("a", "1"), ("b", "2")]), MissingFieldPolicy::Empty)
            .unwrap();
        assert_eq!(rendered, "a: 1\nb: 2\n");
    }

    #[test]
    fn test_normalize_line_breaks() {
        assert_eq!(normalize_line_breaks("one\r\ntwo\nthree", "  "), "one  two\nthree");
        assert_eq!(normalize_line_breaks("one\r\ntwo", " | "), "one | two");
    }
}
