//! Hydration module.
//!
//! Snapshot dispatch, render-pass bookkeeping and props composition.
//!
//! # Examples
//!
//! ```rust,no_run
//! use reinhardt_store::hydration::{HydrationGate, compose};
//! ```

pub use reinhardt_store_core::hydration::*;
pub use reinhardt_store_core::props::{
	INITIAL_STATE_KEY, PAGE_PROPS_KEY, PROPS_KEY, PROPS_SCRIPT_ID, compose, page_snapshot,
	strip_snapshot,
};
