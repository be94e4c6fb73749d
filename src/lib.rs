pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
#[cfg(feature = "server")]
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{openai::OpenAiClient, storage::LocalStorage};
pub use config::CodegenConfig;
pub use core::pipeline::{CodegenPipeline, PipelineOptions, PipelineState, RunContext, WorkspaceMode};
pub use domain::model::{ArtifactBundle, ArtifactKind, ProjectTree, Schema};
pub use domain::ports::{CompletionService, Storage};
pub use utils::error::{CodegenError, Result};
