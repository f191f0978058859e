//! # aec-stream-core
//!
//! Streaming frame adapter for acoustic echo-cancellation engines.
//!
//! Echo-cancellation engines consume and produce fixed-size frames (10 ms per
//! call). This crate turns arbitrarily chunked multichannel audio into those
//! frame calls and turns the engine's frames back into caller-sized output.
//! The engine itself plugs in through the `EchoEngine` trait.
//!
//! ## Architecture
//!
//! ```text
//! aec-stream-core (this crate)
//! ├── traits/       ← EchoEngine (native engine boundary)
//! ├── engine/       ← PassthroughEngine (reference engine, no cancellation)
//! ├── models/       ← StreamError, SessionConfig, Direction, FrameLayout, diagnostics
//! ├── processing/   ← FrameAccumulator, output size prediction
//! └── session/      ← Endpoint, EchoCancellerSession, SharedSession
//! ```
//!
//! ## Data flow
//!
//! ```text
//! render chunk  → [render Endpoint]  → frame → engine.analyze_render
//! capture chunk → [capture Endpoint] → frame → engine.analyze_capture
//!                                            → engine.process_capture → output frames
//! ```

pub mod engine;
pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

#[cfg(test)]
mod test_support;

// Re-export key types at crate root for convenience.
pub use engine::passthrough::PassthroughEngine;
pub use models::config::{AnalyzeOptions, FrameTransform, ProcessOptions, SessionConfig};
pub use models::diagnostics::{EndpointDiagnostics, SessionDiagnostics};
pub use models::error::{EngineError, StreamError};
pub use models::shape::{Direction, Frame, FrameLayout, StreamShape};
pub use processing::accumulator::FrameAccumulator;
pub use processing::predictor::{frames_completed, predict_output_length};
pub use session::canceller::EchoCancellerSession;
pub use session::endpoint::{Endpoint, ShapeChange};
pub use session::shared::SharedSession;
pub use traits::engine::EchoEngine;
