use crate::config::{
    ConvertSettings, DEFAULT_INPUT_ENCODING, DEFAULT_LINE_BREAK_REPLACEMENT, DEFAULT_TEMPLATE_DIR,
};
use crate::core::{MissingFieldPolicy, RenderErrorPolicy, ScalarMode};
use crate::utils::error::{ConvertError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub template: TemplateConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    pub name: Option<String>,
    pub input_path: String,
    pub template: String,
    pub output_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    pub encoding: Option<String>,
    pub delimiter: Option<char>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub directory: Option<String>,
    pub missing_field: Option<MissingFieldPolicy>,
    pub on_render_error: Option<RenderErrorPolicy>,
    pub line_break_replacement: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub delimiter: Option<char>,
    pub scalars: Option<ScalarMode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ConvertError::Io)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ConvertError::Config {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SUPPLIER_DIR})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConvertError::Config {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 轉換為 pipeline 使用的設定
    pub fn to_settings(&self) -> ConvertSettings {
        ConvertSettings {
            input_path: self.conversion.input_path.clone(),
            template: self.conversion.template.clone(),
            output_path: self.conversion.output_path.clone(),
            template_dir: self
                .template
                .directory
                .clone()
                .unwrap_or_else(|| DEFAULT_TEMPLATE_DIR.to_string()),
            input_encoding: self
                .input
                .encoding
                .clone()
                .unwrap_or_else(|| DEFAULT_INPUT_ENCODING.to_string()),
            input_delimiter: self.input.delimiter.unwrap_or(','),
            output_delimiter: self.output.delimiter.unwrap_or(','),
            line_break_replacement: self
                .template
                .line_break_replacement
                .clone()
                .unwrap_or_else(|| DEFAULT_LINE_BREAK_REPLACEMENT.to_string()),
            missing_field: self.template.missing_field.unwrap_or_default(),
            on_render_error: self.template.on_render_error.unwrap_or_default(),
            scalar_mode: self.output.scalars.unwrap_or_default(),
        }
    }

    pub fn name(&self) -> &str {
        self.conversion.name.as_deref().unwrap_or(&self.conversion.template)
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        let paths = [
            ("conversion.input_path", &self.conversion.input_path),
            ("conversion.template", &self.conversion.template),
            ("conversion.output_path", &self.conversion.output_path),
        ];
        for (field, value) in paths {
            if value.contains("${") {
                return Err(ConvertError::MissingConfig {
                    field: format!("environment variable in {} ({})", field, value),
                });
            }
        }
        self.to_settings().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[conversion]
name = "bromic"
input_path = "suppliers/bromic.csv"
template = "bromic.yml"
output_path = "exports/bromic.csv"

[input]
encoding = "utf-8"
delimiter = ";"

[template]
directory = "supplier-templates"
missing_field = "error"
on_render_error = "abort"
line_break_replacement = " | "

[output]
scalars = "text"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let settings = config.to_settings();

        assert_eq!(config.name(), "bromic");
        assert_eq!(settings.input_path, "suppliers/bromic.csv");
        assert_eq!(settings.template_dir, "supplier-templates");
        assert_eq!(settings.input_encoding, "utf-8");
        assert_eq!(settings.input_delimiter, ';');
        assert_eq!(settings.output_delimiter, ',');
        assert_eq!(settings.line_break_replacement, " | ");
        assert_eq!(settings.missing_field, MissingFieldPolicy::Error);
        assert_eq!(settings.on_render_error, RenderErrorPolicy::Abort);
        assert_eq!(settings.scalar_mode, ScalarMode::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_when_sections_are_missing() {
        let toml_content = r#"
[conversion]
input_path = "brema.csv"
template = "brema.yml"
output_path = "brema-woo.csv"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.name(), "brema.yml");
        assert_eq!(config.to_settings(), ConvertSettings::new("brema.csv", "brema.yml", "brema-woo.csv"));
        assert!(!config.verbose());
        assert!(!config.json_logs());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CATALOG_ETL_TEST_SUPPLIER_DIR", "/data/suppliers");

        let toml_content = r#"
[conversion]
input_path = "${CATALOG_ETL_TEST_SUPPLIER_DIR}/bromic.csv"
template = "bromic.yml"
output_path = "out.csv"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.conversion.input_path, "/data/suppliers/bromic.csv");

        std::env::remove_var("CATALOG_ETL_TEST_SUPPLIER_DIR");
    }

    #[test]
    fn test_unset_env_var_fails_validation() {
        let toml_content = r#"
[conversion]
input_path = "${CATALOG_ETL_TEST_UNSET_VAR}/bromic.csv"
template = "bromic.yml"
output_path = "out.csv"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(matches!(config.validate(), Err(ConvertError::MissingConfig { .. })));
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        let toml_content = r#"
[conversion]
input_path = "a.csv"
template = "a.yml"
output_path = "b.csv"

[template]
missing_field = "guess"
"#;

        assert!(matches!(
            TomlConfig::from_toml_str(toml_content),
            Err(ConvertError::Config { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[conversion]
name = "file-test"
input_path = "a.csv"
template = "a.yml"
output_path = "b.csv"

[logging]
verbose = true
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.name(), "file-test");
        assert!(config.verbose());
    }
}
