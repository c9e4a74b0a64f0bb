use crate::core::record_parser::{parse_record, ParseOutcome};
use crate::core::template::{normalize_line_breaks, Template, TemplateStore};
use crate::core::{
    reader, writer, ConfigProvider, ConversionResult, FailureStage, InputRecord, Pipeline,
    RecordFailure, RenderErrorPolicy, Storage,
};
use crate::utils::error::{ConvertError, Result};
use std::path::Path;

/// Supplier CSV -> template -> YAML -> WooCommerce CSV.
pub struct CatalogPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> CatalogPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    pub fn load_template(&self) -> Result<Template> {
        TemplateStore::new(&self.storage, self.config.template_dir()).load(self.config.template())
    }

    /// Output path with `{template}` and `{timestamp}` filled in.
    pub fn resolve_output_path(&self) -> String {
        let template_stem = Path::new(self.config.template())
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.config
            .output_path()
            .replace("{template}", &template_stem)
            .replace(
                "{timestamp}",
                &chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string(),
            )
    }

    fn convert_record(
        &self,
        template: &Template,
        record: &InputRecord,
        result: &mut ConversionResult,
    ) -> Result<()> {
        let rendered = match template.render(record, self.config.missing_field_policy()) {
            Ok(rendered) => rendered,
            Err(e) => match self.config.render_error_policy() {
                RenderErrorPolicy::Abort => return Err(e),
                RenderErrorPolicy::Skip => {
                    tracing::warn!("❌ Row {} (line {}): {}", record.row, record.line, e);
                    result.failures.push(RecordFailure {
                        row: record.row,
                        stage: FailureStage::Render,
                        text: None,
                        error: e.to_string(),
                    });
                    return Ok(());
                }
            },
        };

        let text = normalize_line_breaks(&rendered, self.config.line_break_replacement());

        match parse_record(&text, self.config.scalar_mode()) {
            Ok(ParseOutcome::Parsed(output)) => result.records.push(output),
            Ok(ParseOutcome::Empty) => {
                tracing::debug!("Row {} rendered to nothing, skipping", record.row);
                result.skipped += 1;
            }
            Err(e) => {
                tracing::warn!("❌ Row {} (line {}): {}", record.row, record.line, e);
                tracing::warn!("📝 Offending text:\n{}", text);
                result.failures.push(RecordFailure {
                    row: record.row,
                    stage: FailureStage::Parse,
                    text: Some(text),
                    error: e.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl<S: Storage, C: ConfigProvider> Pipeline for CatalogPipeline<S, C> {
    fn extract(&self) -> Result<Vec<InputRecord>> {
        let path = self.config.input_path();
        tracing::debug!("Reading supplier file: {}", path);

        let bytes = self.storage.read_file(path).map_err(|e| ConvertError::Input {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let encoding = reader::resolve_encoding(self.config.input_encoding())?;

        reader::read_records(path, &bytes, encoding, self.config.input_delimiter())
    }

    fn transform(&self, data: Vec<InputRecord>) -> Result<ConversionResult> {
        let template = self.load_template()?;
        tracing::debug!(
            "Template '{}' references {} columns",
            template.name(),
            template.fields().len()
        );

        let mut result = ConversionResult {
            input_count: data.len(),
            ..Default::default()
        };
        for record in &data {
            self.convert_record(&template, record, &mut result)?;
        }

        tracing::info!("No of products with wrong syntax: {}", result.failed());
        Ok(result)
    }

    fn load(&self, result: &ConversionResult) -> Result<String> {
        let output_path = self.resolve_output_path();
        let data = writer::write_csv(&result.records, self.config.output_delimiter())?;

        tracing::debug!(
            "Writing {} records ({} bytes) to {}",
            result.converted(),
            data.len(),
            output_path
        );
        self.storage.write_file(&output_path, &data)?;
        Ok(output_path)
    }
}
