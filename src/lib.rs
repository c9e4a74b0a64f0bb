pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::LocalStorage;
pub use config::{toml_config::TomlConfig, ConvertSettings};
pub use core::{etl::ConversionEngine, pipeline::CatalogPipeline};
pub use utils::error::{ConvertError, Result};
