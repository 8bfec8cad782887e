pub mod error;
pub mod guard;
pub mod probe;
pub mod report;
pub mod runtime;
pub mod store;

pub use error::PidfileError;
pub use guard::{GuardState, SessionGuard, SessionStatus, inspect, pid_file};
pub use probe::{LivenessProbe, SystemProbe};
pub use report::{Reporter, Severity, TracingReporter};
pub use store::PidRecord;
