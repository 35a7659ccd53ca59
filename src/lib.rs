//! # WiFi Scope Library
//!
//! Overlay geo-referenced WiFi quality markers onto a live camera scene.
//!
//! This library provides the two core subsystems: the spatial annotation
//! engine (screen-to-world projection, billboarded markers, per-frame
//! distance scaling) and the measurement streaming pipeline (fixed-cadence
//! network sampling, classification, and subscriber fan-out).

pub mod app;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod measurement;
pub mod notify;
pub mod persistence;
pub mod scene;
