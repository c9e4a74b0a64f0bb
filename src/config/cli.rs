use crate::config::{
    ConvertSettings, DEFAULT_INPUT_ENCODING, DEFAULT_LINE_BREAK_REPLACEMENT, DEFAULT_TEMPLATE_DIR,
};
use crate::core::{MissingFieldPolicy, RenderErrorPolicy, ScalarMode};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "catalog-etl")]
#[command(about = "Convert a supplier CSV catalog into a WooCommerce import CSV")]
pub struct CliConfig {
    /// Supplier CSV file
    #[arg(short, long)]
    pub input: String,

    /// Template name (looked up in --template-dir) or path
    #[arg(short, long)]
    pub template: String,

    /// Output CSV; may contain {template} and {timestamp}
    #[arg(short, long)]
    pub output: String,

    #[arg(long, default_value = DEFAULT_TEMPLATE_DIR)]
    pub template_dir: String,

    /// WHATWG encoding label of the supplier file
    #[arg(long, default_value = DEFAULT_INPUT_ENCODING)]
    pub encoding: String,

    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    #[arg(long, default_value_t = ',')]
    pub output_delimiter: char,

    /// Replacement for CR+LF inside rendered values
    #[arg(long, default_value = DEFAULT_LINE_BREAK_REPLACEMENT)]
    pub line_break_replacement: String,

    #[arg(long, value_enum, default_value_t = MissingFieldPolicy::Empty)]
    pub missing_field: MissingFieldPolicy,

    #[arg(long, value_enum, default_value_t = RenderErrorPolicy::Skip)]
    pub on_render_error: RenderErrorPolicy,

    #[arg(long, value_enum, default_value_t = ScalarMode::Typed)]
    pub scalars: ScalarMode,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliConfig {
    pub fn to_settings(&self) -> ConvertSettings {
        ConvertSettings {
            input_path: self.input.clone(),
            template: self.template.clone(),
            output_path: self.output.clone(),
            template_dir: self.template_dir.clone(),
            input_encoding: self.encoding.clone(),
            input_delimiter: self.delimiter,
            output_delimiter: self.output_delimiter,
            line_break_replacement: self.line_break_replacement.clone(),
            missing_field: self.missing_field,
            on_render_error: self.on_render_error,
            scalar_mode: self.scalars,
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        self.to_settings().validate()
    }
}
