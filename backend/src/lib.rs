//! # Facility Compare
//!
//! Side-by-side comparison engine for hospitals and diagnostic laboratories.
//!
//! Users pick up to three facilities of one kind; the engine re-fetches their
//! canonical records, computes distance from the user, the union of their
//! feature flags and the best item per orderable row, and lays everything
//! out as an ordered comparison table.
//!
//! ## Features
//!
//! - **Selection**: bounded, single-type, idempotent selection store
//! - **Aggregation**: concurrent per-item fetches with summary fallback
//! - **Layout**: fixed row order with per-row best-value highlighting
//! - **HTTP API**: session-scoped JSON endpoints for the browser client
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: Data Transfer Objects of a rendered comparison
//! - [`models`]: Facility records, geo points and operating hours
//! - [`db`]: Facility repository trait and its local/REST implementations
//! - [`services`]: Selection store, comparison service and row builder
//! - [`config`]: TOML + environment configuration
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
