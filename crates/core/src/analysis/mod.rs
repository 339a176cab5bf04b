//! Project analysis workflow

pub mod ports;
pub mod report;
pub mod service;

pub use ports::*;
pub use report::AnalysisReport;
pub use service::*;
