pub mod format;
pub mod report;
pub mod time;

pub use report::{JobCatalog, Report, ReportError, ReportSelection};
pub use time::ReportPeriod;
