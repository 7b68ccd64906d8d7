pub mod cli;
pub mod config;
pub mod history;
pub mod llm;
pub mod pipeline;
pub mod server;
pub mod sources;
pub mod transcribe;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{PipelineContext, PipelineOrchestrator, ProgressEvent, RunHandle};
pub use types::{Category, Idea, InputError, ValidationReport};
