pub mod etl;
pub mod pipeline;
pub mod reader;
pub mod record_parser;
pub mod template;
pub mod writer;
pub mod yaml_loader;

pub use crate::domain::model::{
    ConversionResult, FailureStage, InputRecord, MissingFieldPolicy, OutputRecord, RecordFailure,
    RenderErrorPolicy, RunSummary, ScalarMode,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
