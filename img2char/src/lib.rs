//! img2char - batch 2D image to game-ready 3D character pipeline.
//!
//! This library is the orchestration and reliability layer around a set of
//! external engines: mesh reconstruction, optional decimation, and optional
//! skeletal rigging. It contributes bounded-parallel scheduling with
//! partial-failure isolation, a durable execution manifest, and resumable
//! chunked downloads for the multi-gigabyte model weights the mesh engine
//! needs.
//!
//! # Modules
//!
//! - [`discover`] - input enumeration and output-path computation
//! - [`engine`] - capability traits and subprocess adapters for the engines
//! - [`pipeline`] - the per-item stage runner
//! - [`batch`] - the worker-pool scheduler and manifest report
//! - [`fetch`] - resumable chunked file transfer and the weight set
//! - [`config`] - the validated run configuration
//! - [`telemetry`] - batch metrics

pub mod batch;
pub mod config;
pub mod discover;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod telemetry;
