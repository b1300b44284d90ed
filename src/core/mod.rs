// src/core/mod.rs

/// Data structures produced by a scan, chiefly `ScanResult`.
pub mod models;

/// Typed failures raised by the probers.
pub mod error;

/// The probers and the orchestrator that runs them against one domain.
pub mod scanner;

/// JSON persistence of a finished scan.
pub mod export;

/// Plain-text rendering of a finished scan.
pub mod report;
