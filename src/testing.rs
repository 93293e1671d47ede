//! Testing utilities module.
//!
//! # Examples
//!
//! ```rust,no_run
//! use reinhardt_store::testing::{CounterStore, counter_store};
//! ```

pub use reinhardt_store_core::testing::*;
