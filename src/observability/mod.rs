// Observability: metrics for cleaner and analyzer runs

pub mod metrics;
