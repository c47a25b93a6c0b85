pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod stats;

// Cleaning stages and descriptive analyses
pub mod analysis;
pub mod pipeline;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;

// Domain data shapes shared across layers
pub mod domain;

pub mod cli;
pub mod observability;
