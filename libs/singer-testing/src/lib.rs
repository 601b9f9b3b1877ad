//! Test harness for Singer taps and targets.
//!
//! A runner builds a connector from a stored config, drives one of its
//! entry points with stdout/stderr redirected into memory, then parses the
//! captured NDJSON and sorts the messages into buckets for assertions:
//!
//! ```ignore
//! let mut runner = TapTestRunner::<MyTap>::new(config);
//! runner.sync_all()?;
//! assert_eq!(runner.records("users").len(), 3);
//! ```

pub mod capture;
pub mod error;
pub mod output;
pub mod runner;
pub mod tap;
pub mod target;

pub use capture::{capture, CapturedOutput};
pub use error::TestingError;
pub use output::{clean_sync_output, typed_messages, ClassifySummary, MessageBuckets, RawMessage};
pub use runner::SingerTestRunner;
pub use tap::TapTestRunner;
pub use target::TargetTestRunner;
