#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::{ConfigProvider, MissingFieldPolicy, RenderErrorPolicy, ScalarMode};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEMPLATE_DIR: &str = "templates";
// cp437 is not a WHATWG encoding; windows-1252 decodes the same supplier exports.
pub const DEFAULT_INPUT_ENCODING: &str = "windows-1252";
pub const DEFAULT_LINE_BREAK_REPLACEMENT: &str = "  ";

/// Everything a conversion run needs, handed to the pipeline at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertSettings {
    pub input_path: String,
    pub template: String,
    pub output_path: String,
    pub template_dir: String,
    pub input_encoding: String,
    pub input_delimiter: char,
    pub output_delimiter: char,
    pub line_break_replacement: String,
    pub missing_field: MissingFieldPolicy,
    pub on_render_error: RenderErrorPolicy,
    pub scalar_mode: ScalarMode,
}

impl ConvertSettings {
    pub fn new(
        input_path: impl Into<String>,
        template: impl Into<String>,
        output_path: impl Into<String>,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            template: template.into(),
            output_path: output_path.into(),
            template_dir: DEFAULT_TEMPLATE_DIR.to_string(),
            input_encoding: DEFAULT_INPUT_ENCODING.to_string(),
            input_delimiter: ',',
            output_delimiter: ',',
            line_break_replacement: DEFAULT_LINE_BREAK_REPLACEMENT.to_string(),
            missing_field: MissingFieldPolicy::default(),
            on_render_error: RenderErrorPolicy::default(),
            scalar_mode: ScalarMode::default(),
        }
    }
}

impl ConfigProvider for ConvertSettings {
    fn input_path(&self) -> &str {
        &self.input_path
    }

    fn template(&self) -> &str {
        &self.template
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn template_dir(&self) -> &str {
        &self.template_dir
    }

    fn input_encoding(&self) -> &str {
        &self.input_encoding
    }

    fn input_delimiter(&self) -> char {
        self.input_delimiter
    }

    fn output_delimiter(&self) -> char {
        self.output_delimiter
    }

    fn line_break_replacement(&self) -> &str {
        &self.line_break_replacement
    }

    fn missing_field_policy(&self) -> MissingFieldPolicy {
        self.missing_field
    }

    fn render_error_policy(&self) -> RenderErrorPolicy {
        self.on_render_error
    }

    fn scalar_mode(&self) -> ScalarMode {
        self.scalar_mode
    }
}

impl Validate for ConvertSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input_path", &self.input_path)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_non_empty_string("template", &self.template)?;
        validation::validate_encoding_label("input_encoding", &self.input_encoding)?;
        validation::validate_delimiter("input_delimiter", self.input_delimiter)?;
        validation::validate_delimiter("output_delimiter", self.output_delimiter)?;
        Ok(())
    }
}
