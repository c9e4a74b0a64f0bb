use crate::domain::model::{
    ConversionResult, InputRecord, MissingFieldPolicy, RenderErrorPolicy, ScalarMode,
};
use crate::utils::error::Result;

pub trait Storage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
}

pub trait ConfigProvider {
    fn input_path(&self) -> &str;
    fn template(&self) -> &str;
    fn output_path(&self) -> &str;
    fn template_dir(&self) -> &str;
    fn input_encoding(&self) -> &str;
    fn input_delimiter(&self) -> char;
    fn output_delimiter(&self) -> char;
    fn line_break_replacement(&self) -> &str;
    fn missing_field_policy(&self) -> MissingFieldPolicy;
    fn render_error_policy(&self) -> RenderErrorPolicy;
    fn scalar_mode(&self) -> ScalarMode;
}

pub trait Pipeline {
    fn extract(&self) -> Result<Vec<InputRecord>>;
    fn transform(&self, data: Vec<InputRecord>) -> Result<ConversionResult>;
    fn load(&self, result: &ConversionResult) -> Result<String>;
}
