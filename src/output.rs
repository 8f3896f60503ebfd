mod report;
mod sink;

pub use report::{build_report, severity, tint, ProtocolRow, Report, Severity};
pub use sink::OutputSink;
