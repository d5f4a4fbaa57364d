//! Retry policy for outbound Google API calls.
//!
//! Failures are classified at the remote-call boundary into an [`ErrorKind`]
//! so the attempt loop never looks at transport-library types. The loop keeps
//! every attempt's error, which lets create-style callers spot a retried call
//! that had in fact succeeded server-side (see [`create_verdict`]).

mod classify;
mod duplicate;
mod policy;
mod run;

pub use classify::{ErrorKind, TransportKind, classify, classify_status};
pub use duplicate::{CreateVerdict, create_verdict, is_disguised_success, is_duplicate_error};
pub use policy::{RetryDecision, RetryPolicy, Sleeper, TokioSleeper};
pub use run::{RetryError, run_with_retry};

#[cfg(test)]
pub(crate) use policy::test_helpers;
