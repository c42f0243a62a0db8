pub mod report;

pub use report::{ReportService, ReportSettings, RunSummary};
