//! mortarix-refine — Record refinement via a generative model.
//!
//! Batches extracted records, asks a remote model to tighten references and
//! prose, and parses the JSON it returns. Designed to fail soft: any
//! backend failure returns the original records untouched.

pub mod backend;
pub mod refiner;

pub use backend::{GeminiBackend, LlmBackend, LlmError, LlmRequest, LlmResponse, Message,
                  OpenAiCompatibleBackend};
pub use refiner::{drop_unreferenced, extract_json_array, KeyCursor, RefineConfig, Refiner};
