//! Cash/holdings ledger and its on-disk store.
//!
//! `Ledger` is a plain value with validated state transitions; `LedgerStore`
//! wraps each transition in a load, apply, persist cycle.

mod state;
mod store;

pub use state::{Execution, Ledger};
pub use store::LedgerStore;
