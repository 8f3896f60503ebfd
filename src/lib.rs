//! Probes a host for the SSL/TLS protocol versions it will negotiate.

#[cfg(feature = "cli")]
pub mod cli;
pub mod engine;
pub mod error;
pub mod input;
pub mod model;
pub mod output;
pub mod probe;
pub mod util;

pub use engine::ProbeOrchestrator;
pub use error::ProbeError;
pub use model::{ProtocolVersion, TargetSpec};
