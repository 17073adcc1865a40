/// Probe execution - one probe per monitor type behind a common trait
///
/// This module is responsible for:
/// - Executing HTTP/TCP/ICMP/DNS/certificate probes
/// - Routing monitors to the right probe
/// - Validating monitor targets
pub mod cert;
pub mod checker;
pub mod executor;
pub mod target;
pub mod types;
pub mod validation;

pub use checker::Probe;
pub use executor::CheckDispatcher;
pub use types::{Classification, ProbeOutcome};
