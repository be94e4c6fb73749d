// Adapters layer: concrete implementations for external systems (generation service, storage).

pub mod openai;
pub mod storage;
