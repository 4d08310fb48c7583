//! Probes which TLS protocol versions a server accepts and judges the result
//! against a policy of acceptable and unacceptable versions.

#[cfg(feature = "cli")]
pub mod cli;
pub mod connector;
pub mod error;
pub mod method;
pub mod model;
pub mod output;
pub mod policy;
pub mod prober;
pub mod report;
pub mod util;

pub use connector::{Handshaker, OpensslHandshaker};
pub use error::{AttemptError, CheckError, ErrorKind};
pub use method::CheckMethod;
pub use model::{AttemptResult, CheckerOptions};
pub use policy::Policy;
pub use prober::Prober;
pub use report::CheckReport;
