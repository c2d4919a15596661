pub mod config;
pub mod error;

pub use config::{
    artifact_name, load_dotenv, CategoryConfig, CombinePolicy, CombinedPair, CompilerConfig,
    DomainSetSource, OutputConfig, PipelineConfig,
};
pub use error::*;
