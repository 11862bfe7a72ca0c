pub mod export;
pub mod issues;
pub mod stats;
