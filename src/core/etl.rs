use crate::core::{ConversionResult, Pipeline, RunSummary};
use crate::utils::error::Result;
use std::time::Instant;

pub struct ConversionEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ConversionEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        let result = self.convert()?;

        tracing::info!("💾 Writing output...");
        let output_path = self.pipeline.load(&result)?;
        tracing::info!(
            "✅ Wrote {} records to {} in {:?}",
            result.converted(),
            output_path,
            started.elapsed()
        );

        Ok(summarize(&result, Some(output_path)))
    }

    /// Reads and converts without writing anything.
    pub fn dry_run(&self) -> Result<RunSummary> {
        let result = self.convert()?;
        Ok(summarize(&result, None))
    }

    fn convert(&self) -> Result<ConversionResult> {
        tracing::info!("📥 Reading supplier catalog...");
        let records = self.pipeline.extract()?;
        tracing::info!("📥 Read {} records", records.len());

        tracing::info!("🔄 Rendering templates...");
        let result = self.pipeline.transform(records)?;
        tracing::info!(
            "🔄 Converted {} records, {} failed, {} empty",
            result.converted(),
            result.failed(),
            result.skipped
        );
        if result.failed() > 0 {
            tracing::warn!("⚠️ {} records were left out of the output", result.failed());
        }

        Ok(result)
    }
}

fn summarize(result: &ConversionResult, output_path: Option<String>) -> RunSummary {
    RunSummary {
        output_path,
        input_records: result.input_count,
        converted: result.converted(),
        failed: result.failed(),
        skipped: result.skipped,
    }
}
