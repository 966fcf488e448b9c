//! StudioFlow Core — marker-driven video rough-cut generator.
//!
//! This crate provides:
//! - **models**: Data structures (markers, segments, clip analysis, plans, jobs).
//! - **lexer**: Tokenizes `slate … done` marker speech into command tokens.
//! - **command_parser**: Parses command tokens into structured `ParsedCommands`.
//! - **markers**: Detects audio markers from a word-timestamped transcript.
//! - **segments**: Converts markers into ordered timeline `Segment`s.
//! - **transcript_analyzer**: Marker-free heuristics (sentiment, topic, quote scoring).
//! - **rough_cut**: The rough-cut engine — clip analysis and the per-style cut pipelines.
//! - **background_services**: Directory watcher, transcription worker pool, auto rough-cut.
//! - **metadata**: Probe duration and loudness, normalize audio, cut segments via ffprobe/ffmpeg.
//! - **project_io**: JSON project save/load.
//! - **timeline_export**: EDL and FCPXML generation.

pub mod background_services;
pub mod command_parser;
pub mod lexer;
pub mod markers;
pub mod metadata;
pub mod models;
pub mod project_io;
pub mod rough_cut;
pub mod segments;
pub mod timeline_export;
pub mod transcript_analyzer;

// Re-export key types for convenience.
pub use models::*;
