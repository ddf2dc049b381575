//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `sensor` - tilt sample producers (scripted waveform, JSONL replay)
//! - `egress` - session summary output to file (JSONL format)
//! - `deck_store` - persistent deck storage (JSON file)
//! - `generate` - HTTP client for the remote deck generator

pub mod deck_store;
pub mod egress;
pub mod generate;
pub mod sensor;

// Re-export commonly used types
pub use deck_store::DeckStore;
pub use egress::Egress;
pub use generate::GenerateClient;
pub use sensor::ScriptedSensor;
