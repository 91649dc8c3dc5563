//! PedalWatch daemon library
//!
//! The sampling thread owns the device and all detector state. It polls,
//! evaluates, publishes a frame per step and speaks alerts. The HTTP bridge
//! runs on the tokio runtime and drains whatever has been published since
//! the previous request.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod cli;
pub mod clock;
pub mod connection;
pub mod daemon;
pub mod logging;
pub mod responder;
pub mod sampler;
pub mod shutdown;
pub mod speech;

pub use cli::{Args, Backend, DaemonConfig};
pub use connection::{ConnectionManager, PollOutcome, RescanOutcome};
pub use daemon::{exit_code, run};
pub use logging::init_logging;
pub use responder::{BridgeState, router};
pub use sampler::{Sampler, SamplerSettings, Step};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use speech::{CommandSpeaker, LogSpeaker, Speaker};
