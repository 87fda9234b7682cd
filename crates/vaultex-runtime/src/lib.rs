//! # vaultex-runtime
//!
//! Runs exchange, ledger and flash-loan operations as atomic units.
//!
//! - [`World`]: token registry + exchange + orchestrator, one notification
//!   journal in mutation order
//! - [`Runtime`]: checkpoint / run / verify / commit-or-restore per unit
//! - [`RuntimeHandle`]: the runtime on a tokio task, shared by async clients
//! - [`Clock`]: per-unit timestamps ([`SystemClock`], [`ManualClock`])
//! - [`telemetry`]: tracing subscriber setup
//!
//! ## Unit Flow
//!
//! ```text
//! client ─▶ RuntimeHandle ─mpsc─▶ task ─▶ Runtime::execute ─▶ World
//!                 ▲                 │
//!                 └──── oneshot ────┤
//!                                   └─broadcast─▶ subscribers (committed events)
//! ```

pub mod clock;
pub mod runtime;
pub mod service;
pub mod telemetry;
pub mod world;

pub use clock::{Clock, ManualClock, SystemClock};
pub use runtime::Runtime;
pub use service::{BoxedBorrower, Operation, Outcome, RuntimeHandle};
pub use telemetry::{LogFormat, init_tracing};
pub use world::{Checkpoint, World};
