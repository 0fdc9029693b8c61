//! # Classifier Playground
//!
//! An image-classifier training harness: scans image-folder datasets, drives
//! a model through epochs with a selectable learning-rate schedule, keeps the
//! top-k checkpoints by a monitored validation metric, and stops training
//! early once that metric stalls.
//!
//! ## Modules
//!
//! - [`checkpoint`] — Top-k checkpoint retention and the early-stopping signal
//! - [`dataset`] — Image-folder scanning with class maps and sanity checks
//! - [`schedule`] — Learning-rate schedule selection
//! - [`training`] — Epoch driver, model trait, metrics history
//! - [`config`] — TOML configuration loading and validation
//! - [`error`] — Structured error types

pub mod checkpoint;
pub mod config;
pub mod dataset;
pub mod error;
pub mod schedule;
pub mod training;
