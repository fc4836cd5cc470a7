//! Attribution reconstruction: parse a sale notification, estimate when the
//! buyer clicked, pull the events around that instant and rank the campaigns
//! that were clicked most.

#![warn(clippy::unwrap_used)]

pub mod estimator;
pub mod orchestrator;
pub mod parser;
pub mod ranker;

pub use estimator::ClickTimeEstimator;
pub use orchestrator::AnalysisOrchestrator;
pub use parser::MessageParser;
pub use ranker::AttributionRanker;
