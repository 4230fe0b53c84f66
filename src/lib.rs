//! Library root for the `cloud_collector` crate
//! Acquires labeled point-cloud samples per object model for classifier training

// Core error handling
pub mod errors;

// Sensor readings
pub mod point_cloud;

// External collaborator seams
pub mod capture;
pub mod environment;
pub mod features;

// Acquisition loop & dataset building
pub mod acquisition;
pub mod collector;
pub mod dataset;

// Backends
pub mod remote;
pub mod synthetic;

// Configuration & CLI
pub mod cli;
pub mod config;

// Logging
pub mod telemetry;


pub use acquisition::{
    acquire_step,
    CaptureOutcome,   // Captured vs Exhausted
    ExhaustionPolicy, // Keep or drop exhausted readings
    SampleAcquirer,
    SampleForm,
    SampleRecord,
};
pub use collector::{Collector, ModelReport, RunSummary};
pub use dataset::Dataset;
pub use errors::{CollectorError, CollectorResult};
