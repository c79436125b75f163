//! Transaction execution: runs a signed transaction's actions against a
//! chain view, enforcing authority, billing resource usage, and dispatching
//! to the native `pulse` system-contract handlers (`newaccount`, `setcode`,
//! `setabi`). Contract bytecode dispatch beyond these natives is reserved
//! for a future WASM runtime and is a no-op here.
//!
//! [`context::execute_standard`] is the single entry point the block builder
//! and the block manager both call, each against their own fresh
//! [`pulsevm_state::Diff`] so a failed transaction leaves no trace on the
//! block it was being packed into.

mod actions;
mod context;
mod error;
mod handlers;
mod inputs;
mod resources;

pub use actions::{NewAccountData, SetAbiData, SetCodeData};
pub use context::execute_standard;
pub use error::ExecutorError;
pub use handlers::{pulse_account, ACCOUNT_BILLABLE_SIZE};
pub use inputs::{conflicts, Input, TxInputs};
pub use resources::{ResourceKind, ResourceTracker};
