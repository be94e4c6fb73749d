pub mod archive;
pub mod extractor;
pub mod materializer;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod workspace;

pub use crate::domain::model::{ArtifactBundle, ArtifactKind, FileTreeEntry, ProjectTree, Schema};
pub use crate::domain::ports::{CompletionService, Storage};
pub use crate::utils::error::Result;
