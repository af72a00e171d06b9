//! Allocate memory in fixed rounds, keep all of it, then hold the process.
//!
//! This is a memory-pressure tool for trying out container memory limits. With the default
//! [`Config`] it allocates 50 blocks of 1 MB, printing a marker line per block, and then sleeps for
//! an hour so the runtime's limit enforcement can be watched from outside.
//!
//! * [`Driver`] runs the rounds and owns the [`RetentionList`]. Rounds can be stepped one at a
//! time, which is what the tests do.
//! * [`Payload`] is one block. Its buffer is reserved in full before it is written, so memory grows
//! in even steps.
//! * [`Meter`] is a counting allocator the binary installs as the global allocator so the logs can
//! show live heap bytes. It can also enforce a ceiling of its own.
//!
//! Out of memory is not handled: the process is meant to be killed when it crosses the limit.
mod config;
mod driver;
mod error;
mod meter;
mod payload;

pub use config::{Config, BYTES_PER_ROUND, HOLD, ROUNDS};
pub use driver::{Driver, Hold, Phase, RetentionList, Round, Sleep};
pub use error::{Error, Result};
pub use meter::Meter;
pub use payload::{fill_byte, Payload};
