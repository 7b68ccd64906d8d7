pub mod client;
pub mod function;

pub use client::LLMClient;
pub use function::{AnalysisError, AnalysisFunction, AnalysisRequest};
