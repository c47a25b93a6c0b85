// Cleaning stages, applied in this order: dedupe, parse, normalize, quality gate, outliers

pub mod dedupe;
pub mod parser;
pub mod normalize;
pub mod quality_gate;
pub mod outliers;
