//! peglint core library.
//!
//! A debounced, race-free lint pipeline for grammar playgrounds. Edits to the
//! grammar and code buffers are coalesced by a [`Debouncer`], analyzed by an
//! external [`Analyzer`] through the [`AnalysisGateway`], and turned into
//! two-stage display state by [`render`]. [`PipelineController`] ties these
//! together and maps clicked diagnostics back to source positions.

#![warn(missing_docs)]

/// Versioned in-memory editor buffers.
pub mod buffer;
/// Pipeline configuration and its JSON loader.
pub mod config;
/// The pipeline state machine.
pub mod controller;
/// Host-clocked, last-write-wins debouncing.
pub mod debounce;
/// Analyzer boundary and response decoding.
pub mod gateway;
/// Two-stage result rendering.
pub mod render;
/// Key-value persistence of buffer texts.
pub mod store;

// ── Convenience re-exports ──────────────────────────────────────────────────

pub use buffer::{Snapshot, SourceBuffer};
pub use config::{ConfigError, DEFAULT_DEBOUNCE, PipelineConfig, StorageKeys, load_config_from_str};
pub use controller::{CycleOutcome, NavigationTarget, PipelineController, PipelineState};
pub use debounce::Debouncer;
pub use gateway::{
    AnalysisError, AnalysisGateway, AnalysisResult, Analyzer, AnalyzerError, decode_response,
};
pub use render::{RenderState, StageState, render};
pub use store::{KeyValueStore, MemoryStore, StoreError};

// Diagnostics (re-exported from the diagnostics crate)
pub use peglint_diagnostics::{Diagnostic, LineIndex, Position, Stage, resolve_target};

// Hosts pass these to the controller.
pub use web_time::Instant;
